use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::{Modify, OpenApi};

/// 为 Swagger UI 提供 Servers 配置。
///
/// - 经文接口同时挂载在根路径与 `config.api.prefix`（默认 /api）下。
/// - `/health` 只在根路径。
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径"))
            .build();

        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("带前缀的业务接口（默认 /api）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api")
                    .description(Some(
                        "业务接口前缀：对应 config.api.prefix（可通过 APP_API__PREFIX 覆盖）",
                    )),
            )
            .build();

        openapi.servers = Some(vec![root, api]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::ayat::handler::get_ayat_json,
        crate::features::ayat::handler::get_ayat_image,
        crate::features::ayat::handler::list_themes,
    ),
    components(schemas(
        crate::features::ayat::models::VerseRecord,
        crate::features::ayat::models::BilingualText,
        crate::features::ayat::handler::ThemesResponse,
        crate::features::health::handler::HealthResponse,
        crate::error::ErrorBody,
        crate::error::ProblemDetails,
    )),
    modifiers(&ApiServers),
    tags(
        (
            name = "Ayat",
            description = "经文：随机经文 JSON、经文卡片 PNG 与主题列表。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Ayat Backend API",
        version = env!("CARGO_PKG_VERSION"),
        description = "随机经文服务（Axum + utoipa）。经文接口同时挂载在根路径与 `config.api.prefix`（默认 /api）下。"
    )
)]
pub struct ApiDoc;
