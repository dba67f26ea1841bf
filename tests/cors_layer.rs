use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use ayat_backend::config::AppConfig;
use ayat_backend::features::ayat::StaticAyatSource;
use ayat_backend::features::image::{CardRenderer, RenderOptions, load_font_db};
use ayat_backend::{AppState, create_app};

const ORIGIN: &str = "https://quran.example";

fn app_with(config: AppConfig) -> Router {
    let entry = json!({
        "surah": 1,
        "ayah": 1,
        "text": {"arabic": "بِسْمِ اللَّهِ", "english": "In the name of Allah"}
    });
    let renderer = CardRenderer::new(
        load_font_db(None, false),
        None,
        RenderOptions::from_config(&config),
    );
    let state = AppState::new(
        Arc::new(StaticAyatSource::new(vec![entry])),
        renderer,
        config.image.clone(),
    );
    create_app(state, &config)
}

fn cors_enabled(origins: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.cors.enabled = true;
    config.cors.allowed_origins = origins.iter().map(|o| o.to_string()).collect();
    config
}

fn from_origin(method: &str, uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .expect("build request")
}

#[tokio::test]
async fn allowed_origin_is_echoed_on_ayat_routes() {
    let app = app_with(cors_enabled(&[ORIGIN]));

    for uri in ["/ayat/themes", "/ayat/json"] {
        let resp = app
            .clone()
            .oneshot(from_origin("GET", uri, ORIGIN))
            .await
            .expect("call app");
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let allow_origin = resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .expect("missing allow origin")
            .to_str()
            .expect("invalid allow origin");
        assert_eq!(allow_origin, ORIGIN, "{uri}");
    }
}

#[tokio::test]
async fn preflight_allows_only_get_by_default() {
    let app = app_with(cors_enabled(&[ORIGIN]));
    assert_eq!(AppConfig::default().cors.allowed_methods, vec!["GET"]);

    let mut req = from_origin("OPTIONS", "/ayat/image", ORIGIN);
    req.headers_mut().insert(
        header::ACCESS_CONTROL_REQUEST_METHOD,
        "GET".parse().expect("header value"),
    );
    let resp = app.oneshot(req).await.expect("call app");

    let allow_methods = resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .expect("missing allow methods")
        .to_str()
        .expect("invalid allow methods");
    assert!(allow_methods.contains("GET"));
    assert!(!allow_methods.contains("POST"));
}

#[tokio::test]
async fn unknown_origin_gets_no_allow_origin() {
    let app = app_with(cors_enabled(&[ORIGIN]));
    let resp = app
        .oneshot(from_origin("GET", "/ayat/themes", "https://elsewhere.example"))
        .await
        .expect("call app");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn wildcard_origin_allows_any_caller() {
    let app = app_with(cors_enabled(&["*"]));
    let resp = app
        .oneshot(from_origin("GET", "/health", "https://anyone.example"))
        .await
        .expect("call app");
    let allow_origin = resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .expect("missing allow origin");
    assert_eq!(allow_origin, "*");
}

#[tokio::test]
async fn service_sends_no_cors_headers_by_default() {
    let app = app_with(AppConfig::default());
    let resp = app
        .oneshot(from_origin("GET", "/ayat/json", ORIGIN))
        .await
        .expect("call app");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn enabled_without_origins_stays_closed() {
    let app = app_with(cors_enabled(&[]));
    let resp = app
        .oneshot(from_origin("GET", "/ayat/themes", ORIGIN))
        .await
        .expect("call app");
    assert!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
