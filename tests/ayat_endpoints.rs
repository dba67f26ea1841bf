use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use ayat_backend::config::AppConfig;
use ayat_backend::features::ayat::{AyatSource, StaticAyatSource, VerseRecord};
use ayat_backend::features::image::{
    CardRenderer, RenderOptions, load_font_db, resolve_palette,
};
use ayat_backend::{AppState, create_app};

fn sample_record() -> Value {
    json!({
        "surah": 2,
        "ayah": 286,
        "text": {
            "arabic": "لَا يُكَلِّفُ اللَّهُ نَفْسًا إِلَّا وُسْعَهَا",
            "english": "Allah does not charge a soul except [with that within] its capacity."
        },
        "hadith": {
            "arabic": "الدين يسر",
            "english": "The religion is ease."
        }
    })
}

fn build_app(source: Arc<dyn AyatSource>) -> Router {
    let config = AppConfig::default();
    let renderer = CardRenderer::new(
        load_font_db(None, false),
        None,
        RenderOptions::from_config(&config),
    );
    let state = AppState::new(source, renderer, config.image.clone());
    create_app(state, &config)
}

fn app_with_sample() -> Router {
    build_app(Arc::new(StaticAyatSource::new(vec![sample_record()])))
}

fn unavailable_app() -> Router {
    build_app(Arc::new(StaticAyatSource::unavailable()))
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("call app")
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

fn content_type(resp: &axum::response::Response) -> String {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[tokio::test]
async fn json_endpoint_returns_the_fetched_record() {
    for uri in ["/ayat/json", "/api/ayat/json"] {
        let resp = get(app_with_sample(), uri).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        assert!(content_type(&resp).starts_with("application/json"));
        let body: Value = serde_json::from_slice(&body_bytes(resp).await).expect("json body");
        assert_eq!(body, sample_record(), "{uri}");
    }
}

#[tokio::test]
async fn image_endpoint_falls_back_to_dark_theme() {
    let resp = get(
        app_with_sample(),
        "/ayat/image?theme=bogus&width=400&height=400",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "image/png");

    let img = image::load_from_memory(&body_bytes(resp).await)
        .expect("decode png")
        .to_rgba8();
    assert_eq!(img.dimensions(), (400, 400));

    let dark = resolve_palette("dark");
    let hex = |p: &image::Rgba<u8>| format!("#{:02x}{:02x}{:02x}", p[0], p[1], p[2]);
    assert_eq!(hex(img.get_pixel(0, 0)), dark.border);
    assert_eq!(hex(img.get_pixel(11, 200)), dark.background);
}

#[tokio::test]
async fn image_defaults_follow_orientation() {
    let resp = get(app_with_sample(), "/api/ayat/image?type=horizontal").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let img = image::load_from_memory(&body_bytes(resp).await).expect("decode png");
    assert_eq!((img.width(), img.height()), (800, 300));

    let resp = get(app_with_sample(), "/ayat/image?theme=light").await;
    let img = image::load_from_memory(&body_bytes(resp).await).expect("decode png");
    assert_eq!((img.width(), img.height()), (800, 500));
}

#[tokio::test]
async fn fetch_failure_returns_legacy_error_body() {
    for uri in [
        "/ayat/json",
        "/ayat/image",
        "/api/ayat/json",
        "/api/ayat/image?theme=ocean",
    ] {
        let resp = get(unavailable_app(), uri).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        let body: Value = serde_json::from_slice(&body_bytes(resp).await).expect("json body");
        assert_eq!(body, json!({"error": "Failed to fetch ayat data"}), "{uri}");
    }
}

#[tokio::test]
async fn out_of_range_dimensions_are_problem_details() {
    let resp = app_with_sample()
        .oneshot(
            Request::builder()
                .uri("/ayat/image?width=10&height=400")
                .header("x-request-id", "dim.req-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("call app");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(content_type(&resp), "application/problem+json");

    let body: Value = serde_json::from_slice(&body_bytes(resp).await).expect("json body");
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["status"], 422);
    assert_eq!(body["requestId"], "dim.req-1");
}

#[tokio::test]
async fn non_numeric_dimensions_are_bad_requests() {
    let resp = get(app_with_sample(), "/ayat/image?width=wide").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn themes_endpoint_lists_palettes() {
    let resp = get(app_with_sample(), "/ayat/themes").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).expect("json body");
    assert_eq!(body["default"], "dark");
    assert_eq!(
        body["themes"],
        json!(["dark", "desert", "forest", "light", "ocean", "royal", "sunset"])
    );
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let resp = get(app_with_sample(), "/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).expect("json body");
    assert_eq!(body["status"], "healthy");

    let resp = get(app_with_sample(), "/api-docs/openapi.json").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Value = serde_json::from_slice(&body_bytes(resp).await).expect("openapi json");
    assert!(doc["paths"]["/ayat/image"]["get"].is_object());
}

#[tokio::test]
async fn responses_are_not_cacheable() {
    let resp = get(app_with_sample(), "/ayat/json").await;
    assert_eq!(
        resp.headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok()),
        Some("no-store")
    );
}

#[tokio::test]
async fn minimal_record_without_hadith_round_trips() {
    let minimal = json!({"surah": 1, "ayah": 1, "text": {"arabic": "ا", "english": "A"}});
    let record = VerseRecord::from_value(minimal.clone()).expect("record");
    let app = build_app(Arc::new(StaticAyatSource::from_records([record])));

    let resp = get(app.clone(), "/ayat/json").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).expect("json body");
    assert_eq!(body, minimal);

    let resp = get(app, "/ayat/image?width=50&height=50").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let img = image::load_from_memory(&body_bytes(resp).await).expect("decode png");
    assert_eq!((img.width(), img.height()), (50, 50));
}

#[tokio::test]
async fn json_endpoint_echoes_extra_fields() {
    let mut entry = sample_record();
    entry["surahName"] = json!("Al-Baqarah");
    entry["juz"] = json!(3);
    let app = build_app(Arc::new(StaticAyatSource::new(vec![entry.clone()])));

    let resp = get(app.clone(), "/ayat/json").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).expect("json body");
    assert_eq!(body, entry);

    let resp = get(app, "/ayat/image?width=200&height=200").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn broken_entry_only_fails_the_request_that_picks_it() {
    let broken = json!({"surah": 1, "ayah": 2, "text": {"arabic": "ب"}});

    // 只有坏条目：JSON 原样返回，图片按数据不可用处理
    let app = build_app(Arc::new(StaticAyatSource::new(vec![broken.clone()])));
    let resp = get(app.clone(), "/ayat/json").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).expect("json body");
    assert_eq!(body, broken);

    let resp = get(app, "/ayat/image").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).expect("json body");
    assert_eq!(body, json!({"error": "Failed to fetch ayat data"}));

    // 好坏混合：每次请求独立成败，好条目总能被渲染
    let app = build_app(Arc::new(StaticAyatSource::new(vec![sample_record(), broken])));
    let mut rendered = 0;
    for _ in 0..40 {
        let resp = get(app.clone(), "/ayat/image?width=100&height=100").await;
        match resp.status() {
            StatusCode::OK => rendered += 1,
            StatusCode::INTERNAL_SERVER_ERROR => {}
            other => panic!("unexpected status {other}"),
        }
    }
    assert!(rendered > 0, "good entry never rendered");

    for _ in 0..10 {
        let resp = get(app.clone(), "/ayat/json").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
