use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use super::models::VerseRecord;
use super::selector::pick_one;
use crate::error::{AppError, ErrorBody, SourceError};
use crate::features::image::{CardQuery, DEFAULT_THEME, theme_names};
use crate::state::AppState;

/// 主题列表响应
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ThemesResponse {
    /// 可用主题名（字母序）
    #[schema(example = json!(["dark", "desert", "forest", "light", "ocean", "royal", "sunset"]))]
    pub themes: Vec<String>,
    /// 未知主题回退到的主题
    #[schema(example = "dark")]
    pub default: String,
}

/// 拉取整个集合并随机取一条（未解析的原始条目）。
async fn random_entry(state: &AppState) -> Result<Value, AppError> {
    let entries = state.source.fetch_all().await?;
    let total = entries.len();
    let entry = pick_one(entries, &mut rand::thread_rng()).ok_or(SourceError::Empty)?;
    tracing::debug!(
        "随机选中经文 {}:{}（共 {} 条）",
        entry["surah"],
        entry["ayah"],
        total
    );
    Ok(entry)
}

/// 随机取一条并解析为可渲染的记录；仅本次选中的条目损坏时失败。
async fn random_record(state: &AppState) -> Result<VerseRecord, AppError> {
    let entry = random_entry(state).await?;
    VerseRecord::from_value(entry).map_err(|e| {
        tracing::warn!("选中的经文条目无法解析: {}", e);
        AppError::DataUnavailable(e)
    })
}

/// 每次请求结果随机，禁止中间层缓存
fn no_store_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers
}

#[utoipa::path(
    get,
    path = "/ayat/json",
    summary = "随机经文（JSON）",
    description = "从远端数据源拉取经文集合并等概率返回其中一条，原样输出该条目（包括额外字段）。",
    responses(
        (status = 200, description = "随机经文记录", body = VerseRecord),
        (status = 500, description = "数据源不可用", body = ErrorBody)
    ),
    tag = "Ayat"
)]
pub async fn get_ayat_json(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let entry = random_entry(&state).await?;
    Ok((no_store_headers(), Json(entry)))
}

#[utoipa::path(
    get,
    path = "/ayat/image",
    summary = "随机经文卡片（PNG）",
    description = "随机取一条经文，按主题与尺寸渲染为带边框、出处与页脚的 PNG 卡片。未知主题回退为 dark。",
    params(CardQuery),
    responses(
        (status = 200, description = "PNG bytes", content_type = "image/png"),
        (status = 400, description = "query 参数无法解析"),
        (status = 422, description = "尺寸超出范围", body = crate::error::ProblemDetails),
        (status = 500, description = "数据源不可用或渲染失败", body = ErrorBody)
    ),
    tag = "Ayat"
)]
pub async fn get_ayat_image(
    State(state): State<AppState>,
    Query(q): Query<CardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let t_total = Instant::now();
    let spec = q.resolve(&state.image)?;
    let record = random_record(&state).await?;
    let t_fetch = t_total.elapsed();

    let _permit = state
        .render_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;

    let t_render = Instant::now();
    let renderer = state.renderer.clone();
    let log_spec = spec.clone();
    let png = tokio::task::spawn_blocking(move || renderer.render_png(&record, &spec))
        .await
        .map_err(|e| AppError::Internal(format!("阻塞渲染任务执行失败: {e}")))??;

    tracing::info!(
        "经文卡片渲染完成: theme={}, {}x{}, {} bytes, 拉取 {:?}, 渲染 {:?}",
        log_spec.theme,
        log_spec.width,
        log_spec.height,
        png.len(),
        t_fetch,
        t_render.elapsed()
    );

    let mut headers = no_store_headers();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    Ok((StatusCode::OK, headers, png))
}

#[utoipa::path(
    get,
    path = "/ayat/themes",
    summary = "主题列表",
    description = "列出卡片可用的配色主题。",
    responses((status = 200, description = "主题列表", body = ThemesResponse)),
    tag = "Ayat"
)]
pub async fn list_themes() -> Json<ThemesResponse> {
    Json(ThemesResponse {
        themes: theme_names().into_iter().map(str::to_string).collect(),
        default: DEFAULT_THEME.to_string(),
    })
}

/// 经文相关路由
pub fn create_ayat_router() -> Router<AppState> {
    Router::new()
        .route("/ayat/json", get(get_ayat_json))
        .route("/ayat/image", get(get_ayat_image))
        .route("/ayat/themes", get(list_themes))
}
