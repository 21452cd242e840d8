use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::card::CardService;
use crate::features::card::canvas::FONT_FILES;
use std::fs;

/// 执行启动检查
///
/// 1. 检查并创建 resources 文件夹
/// 2. 检查字体文件（仅告警）
/// 3. 预热卡片资源缓存（失败仅告警，首个渲染请求会重试）
pub async fn run_startup_checks(
    config: &AppConfig,
    card_service: &dyn CardService,
) -> Result<(), AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    ensure_resources_folder(config)?;
    ensure_font_resources(config);

    let t_prewarm = std::time::Instant::now();
    match card_service.ensure_init().await {
        Ok(()) => tracing::info!("卡片资源预热完成: {}ms", t_prewarm.elapsed().as_millis()),
        Err(e) => tracing::warn!("⚠️ 卡片资源预热失败，将在首个请求时重试: {}", e),
    }

    tracing::info!("✅ 启动检查完成");
    Ok(())
}

/// 确保 resources 文件夹存在
fn ensure_resources_folder(config: &AppConfig) -> Result<(), AppError> {
    let resources_path = config.resources_path();

    if !resources_path.exists() {
        tracing::warn!("📁 未找到 resources 文件夹，正在创建: {:?}", resources_path);
        fs::create_dir_all(&resources_path)
            .map_err(|e| AppError::Internal(format!("创建 resources 文件夹失败: {e}")))?;
        tracing::info!("✅ resources 文件夹创建成功");
    } else {
        tracing::info!("✅ resources 文件夹已存在");
    }

    Ok(())
}

/// 检查字体文件（缺失时仅告警，文字将回退到系统字体）
fn ensure_font_resources(config: &AppConfig) {
    let font_dir = config.fonts_path();
    for font in FONT_FILES {
        if font_dir.join(font).exists() {
            tracing::info!("字体存在: {}", font);
        } else {
            tracing::warn!("未找到字体文件: {}", font_dir.join(font).display());
        }
    }
}
