use axum::{Router, routing::get};
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::features::card::create_card_router;
use crate::features::health::health_check;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 明确排除不该压缩的响应：卡片 PNG 本身已压缩，再压缩只会浪费 CPU。
    // 仍保留默认的最小大小阈值（默认 32B），避免“压缩开销覆盖收益”。
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 组装完整路由：`/health`、`{prefix}/card/*` 与 Swagger UI
pub fn build_router(state: AppState, api_prefix: &str) -> Router {
    let api_router = Router::<AppState>::new().merge(create_card_router());

    Router::<AppState>::new()
        .route("/health", get(health_check))
        .nest(api_prefix, api_router)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(CompressionLayer::new().compress_when(compression_predicate()))
}
