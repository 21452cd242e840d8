use std::time::Instant;

use axum::body::Bytes;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use super::types::{CustomImage, RenderRequest};
use crate::{error::AppError, state::AppState};

/// 自定义背景请求体上限
const CUSTOM_IMAGE_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CardQuery {
    /// 卡片语言：en|ja|de|fr，其它值回退到 en
    #[serde(default)]
    pub language: Option<String>,
}

#[utoipa::path(
    get,
    path = "/card/{id}",
    summary = "生成角色卡片",
    description = "拉取角色数据并生成 890×720 的角色卡片（PNG）。",
    params(
        ("id" = String, Path, description = "Lodestone 角色 ID"),
        CardQuery
    ),
    responses(
        (status = 200, description = "PNG bytes of character card"),
        (status = 502, description = "Upstream error", body = crate::error::ProblemDetails),
        (status = 503, description = "Assets not ready", body = crate::error::ProblemDetails)
    ),
    tag = "Card"
)]
pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<CardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut request = RenderRequest::new(id);
    request.language = q.language;
    render(&state, request).await
}

#[utoipa::path(
    post,
    path = "/card/{id}",
    summary = "生成带自定义背景的角色卡片",
    description = "请求体为自定义背景图片的原始字节，绘制在默认底图与半透明面板之间。空请求体等同于 GET。",
    params(
        ("id" = String, Path, description = "Lodestone 角色 ID"),
        CardQuery
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "PNG bytes of character card"),
        (status = 422, description = "Invalid custom image", body = crate::error::ProblemDetails),
        (status = 502, description = "Upstream error", body = crate::error::ProblemDetails)
    ),
    tag = "Card"
)]
pub async fn post_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<CardQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let mut request = RenderRequest::new(id);
    request.language = q.language;
    if !body.is_empty() {
        request = request.with_custom_image(CustomImage::Bytes(body));
    }
    render(&state, request).await
}

async fn render(
    state: &AppState,
    request: RenderRequest,
) -> Result<(HeaderMap, Vec<u8>), AppError> {
    let t_total = Instant::now();
    let character_id = request.character_id.clone();

    let svg = state.card_service.compose_svg(request).await?;
    let t_compose = t_total.elapsed();

    let sem = state.render_semaphore.clone();
    let t_wait = Instant::now();
    let _permit = sem
        .acquire_owned()
        .await
        .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;
    let wait = t_wait.elapsed();

    let png = state.card_service.rasterize(svg).await?;
    tracing::info!(
        "角色卡片 {} 完成: 合成={:?}, 等待许可={:?}, 总计={:?}, 大小={}B",
        character_id,
        t_compose,
        wait,
        t_total.elapsed(),
        png.len()
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok((headers, png))
}

pub fn create_card_router() -> Router<AppState> {
    Router::new().route(
        "/card/:id",
        get(get_card)
            .post(post_card)
            .layer(DefaultBodyLimit::max(CUSTOM_IMAGE_LIMIT)),
    )
}
