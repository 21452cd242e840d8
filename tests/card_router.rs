mod common;

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::{MemoryLoader, card_config, character_payload, character_url, seeded_loader, tiny_png};
use resvg::usvg::fontdb;
use tower::ServiceExt;
use xivcard_backend::app::build_router;
use xivcard_backend::features::card::{CardCreator, CardService};
use xivcard_backend::state::AppState;

fn app(loader: Arc<MemoryLoader>) -> axum::Router {
    let service: Arc<dyn CardService> = Arc::new(CardCreator::with_font_database(
        loader,
        card_config(),
        Arc::new(fontdb::Database::new()),
    ));
    build_router(AppState::new(service, 2), "/api/v1")
}

#[tokio::test]
async fn get_card_returns_png() {
    let loader = Arc::new(seeded_loader("1", &character_payload()));
    let resp = app(loader)
        .oneshot(
            Request::builder()
                .uri("/api/v1/card/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (890, 720));
}

#[tokio::test]
async fn language_query_reaches_upstream() {
    let loader = Arc::new(seeded_loader("1", &character_payload()));
    let resp = app(loader.clone())
        .oneshot(
            Request::builder()
                .uri("/api/v1/card/1?language=fr")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(loader.requests_to(&character_url("1"))[0].contains("language=fr"));
}

#[tokio::test]
async fn post_card_accepts_custom_background() {
    let loader = Arc::new(seeded_loader("1", &character_payload()));
    let resp = app(loader)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/card/1")
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(tiny_png([0, 0, 255, 255])))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_custom_background_is_unprocessable() {
    let loader = Arc::new(seeded_loader("1", &character_payload()));
    let resp = app(loader)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/card/1")
                .body(Body::from("not an image"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
}

#[tokio::test]
async fn upstream_failure_maps_to_bad_gateway() {
    let loader = Arc::new(seeded_loader("1", &character_payload()));
    loader.respond(&character_url("1"), 500, "down");
    let resp = app(loader)
        .oneshot(
            Request::builder()
                .uri("/api/v1/card/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn health_reports_asset_state() {
    let loader = Arc::new(MemoryLoader::default());
    let resp = app(loader)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["assets_ready"], false);
}
