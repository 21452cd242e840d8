use std::sync::Arc;

use xivcard_backend::app::build_router;
use xivcard_backend::config::AppConfig;
use xivcard_backend::features::card::{CardCreator, CardService};
use xivcard_backend::http::HttpLoader;
use xivcard_backend::startup::run_startup_checks;
use xivcard_backend::state::AppState;

#[tokio::main]
async fn main() {
    // 日志级别来自配置，因此先加载配置再初始化 tracing
    if let Err(e) = AppConfig::init_global() {
        eprintln!("Config init failed: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::global();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .init();

    let loader = HttpLoader::shared().unwrap_or_else(|e| {
        tracing::error!("HTTP client init failed: {}", e);
        std::process::exit(1);
    });
    let loader = Arc::new(loader);
    let card_service: Arc<dyn CardService> =
        Arc::new(CardCreator::new(loader, config.card_config()));

    if let Err(e) = run_startup_checks(config, card_service.as_ref()).await {
        tracing::error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    let permits = config.render_permits();
    tracing::info!("渲染并发许可: {}", permits);
    let state = AppState::new(card_service, permits);
    let app = build_router(state, &config.api.prefix);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Card API: http://{}{}/card/{{id}}", addr, config.api.prefix);

    let graceful = axum::serve(listener, app).with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("监听退出信号失败: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("开始优雅关闭HTTP服务器...");
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
