use axum::{Router, routing::get};
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::features::{ayat, health};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

/// 响应压缩策略：明确排除不该压缩的响应（图片本身已压缩，SSE 需要实时性）。
///
/// 保留默认的最小大小阈值（32B）。
pub fn compression_predicate() -> impl Predicate {
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 规范化接口前缀：空串与 "/" 表示不额外挂载。
fn normalized_prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    Some(if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    })
}

/// 组装完整路由：经文接口（根路径 + 前缀）、健康检查、文档、静态资源与中间件。
pub fn create_app(state: AppState, config: &AppConfig) -> Router {
    let public_dir = config.public_path();

    let mut app = Router::<AppState>::new()
        .route("/health", get(health::health_check))
        .merge(ayat::create_ayat_router());
    if let Some(prefix) = normalized_prefix(&config.api.prefix) {
        app = app.nest(&prefix, ayat::create_ayat_router());
    }

    let mut app = app
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/public", ServeDir::new(&public_dir))
        .fallback_service(ServeDir::new(&public_dir))
        .with_state(state)
        .layer(axum::middleware::from_fn(request_id_middleware));

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    app.layer(CompressionLayer::new().compress_when(compression_predicate()))
}

#[cfg(test)]
mod tests {
    use super::{compression_predicate, normalized_prefix};
    use axum::body::Body;
    use axum::http::{Response as HttpResponse, header};
    use tower_http::compression::predicate::Predicate;

    fn should_compress_for(ct: &str) -> bool {
        // 命中 SizeAbove（默认 32B），避免因为 body 太小导致测试不稳定。
        let resp = HttpResponse::builder()
            .header(header::CONTENT_TYPE, ct)
            .body(Body::from(vec![b'x'; 2048]))
            .expect("build response");
        compression_predicate().should_compress(&resp)
    }

    #[test]
    fn png_cards_are_not_recompressed() {
        assert!(!should_compress_for("image/png"));
        assert!(!should_compress_for("text/event-stream"));
        assert!(!should_compress_for("application/octet-stream"));
    }

    #[test]
    fn json_is_compressed() {
        assert!(should_compress_for("application/json"));
        assert!(should_compress_for("application/problem+json"));
    }

    #[test]
    fn prefix_normalization() {
        assert_eq!(normalized_prefix("/api").as_deref(), Some("/api"));
        assert_eq!(normalized_prefix("api/").as_deref(), Some("/api"));
        assert_eq!(normalized_prefix("/v1/api/").as_deref(), Some("/v1/api"));
        assert_eq!(normalized_prefix("/"), None);
        assert_eq!(normalized_prefix("  "), None);
    }
}
