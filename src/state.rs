use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::features::card::CardService;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 角色卡片生成器（内含资源缓存与字体库）
    pub card_service: Arc<dyn CardService>,
    /// 控制并发渲染的信号量（限制 CPU 密集型任务数量）
    pub render_semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(card_service: Arc<dyn CardService>, render_permits: usize) -> Self {
        Self {
            card_service,
            render_semaphore: Arc::new(Semaphore::new(render_permits.max(1))),
        }
    }
}
