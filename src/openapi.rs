use utoipa::OpenApi;
use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::Modify;

/// 为 Swagger UI 提供正确的“业务接口前缀”Servers 配置。
///
/// - 业务接口默认前缀为 `/api/v1`（对应 `config.api.prefix` / `APP_API_PREFIX`）。
/// - `/health` 不带前缀，因此额外提供 `/` 作为备用 server 以便在 Swagger UI 中切换测试。
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api/v1）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api/v1")
                    .description(Some(
                        "业务接口前缀：对应 config.api.prefix（可通过 APP_API_PREFIX 覆盖）",
                    )),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（用于 /health 等不带前缀接口）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::card::handler::get_card,
        crate::features::card::handler::post_card,
    ),
    components(schemas(
        crate::error::ProblemDetails,
        crate::features::health::handler::HealthResponse,
    )),
    modifiers(&ApiServers),
    tags(
        (
            name = "Card",
            description = "角色卡片：拉取角色数据并生成 890×720 PNG，可选自定义背景。"
        ),
        (name = "Health", description = "健康检查：服务探活与资源缓存状态。"),
    ),
    info(
        title = "XIV Card Backend API",
        version = env!("CARGO_PKG_VERSION"),
        description = "角色卡片服务 API（Axum + utoipa）。注意：除 /health 外，其余业务接口实际挂载在 `config.api.prefix`（默认 /api/v1）下，OpenAPI 的 paths 不包含该前缀。"
    )
)]
pub struct ApiDoc;
