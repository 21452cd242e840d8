//! 角色卡片渲染：资源缓存、角色数据拉取、徽章合成、派生数值与分层绘制。

pub mod assets;
pub mod canvas;
pub mod crest;
pub mod fetcher;
pub mod handler;
pub mod jobs;
pub mod layout;
pub mod loader;
pub mod models;
pub mod renderer;
pub mod service;
pub mod stats;
pub mod types;

use std::path::PathBuf;

pub use assets::{AssetBundle, AssetCache};
pub use handler::create_card_router;
pub use loader::{FetchResponse, ImageAsset, ResourceLoader};
pub use renderer::CardCreator;
pub use service::CardService;
pub use types::{CustomImage, Language, RenderRequest};

/// 渲染引擎配置（由 `AppConfig::card_config` 构建，引擎内部不读取全局配置）
#[derive(Debug, Clone, Default)]
pub struct CardConfig {
    /// 本地图片资源目录
    pub resources_dir: PathBuf,
    /// Source Sans Pro 字体目录
    pub fonts_dir: PathBuf,
    pub character_api_base: String,
    pub private_key: Option<String>,
    pub mounts_url: String,
    pub minions_url: String,
    pub exception_ids_url: Option<String>,
    pub exception_item_ids: Vec<u32>,
    /// 栅格化时优先速度
    pub optimize_speed: bool,
}
