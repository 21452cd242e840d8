use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::features::card::CardConfig;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 资源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// 资源基础路径（背景、图标、职业背景图）
    pub base_path: String,
    /// 字体目录（Source Sans Pro Regular / SemiBold）
    #[serde(default = "ResourcesConfig::default_fonts_dir")]
    pub fonts_dir: String,
}

impl ResourcesConfig {
    fn default_fonts_dir() -> String {
        "./resources/fonts".to_string()
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（未设置 RUST_LOG 时生效）
    pub level: String,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API 路由前缀
    pub prefix: String,
}

/// 上游服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 角色数据服务基地址（请求路径为 `{base}/character/{id}`）
    #[serde(default = "UpstreamConfig::default_character_api_base")]
    pub character_api_base: String,
    /// 角色数据服务访问密钥（可选，作为 private_key 查询参数）
    #[serde(default)]
    pub private_key: Option<String>,
    /// 坐骑总数接口
    #[serde(default = "UpstreamConfig::default_mounts_url")]
    pub mounts_url: String,
    /// 宠物总数接口
    #[serde(default = "UpstreamConfig::default_minions_url")]
    pub minions_url: String,
    /// 例外物品 ID 列表接口（返回 JSON 整数数组，可选）
    #[serde(default)]
    pub exception_ids_url: Option<String>,
    /// 静态配置的例外物品 ID（与接口结果取并集）
    #[serde(default)]
    pub exception_item_ids: Vec<u32>,
}

impl UpstreamConfig {
    fn default_character_api_base() -> String {
        "http://127.0.0.1:5002".to_string()
    }
    fn default_mounts_url() -> String {
        "https://ffxivcollect.com/api/mounts/".to_string()
    }
    fn default_minions_url() -> String {
        "https://ffxivcollect.com/api/minions/".to_string()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            character_api_base: Self::default_character_api_base(),
            private_key: None,
            mounts_url: Self::default_mounts_url(),
            minions_url: Self::default_minions_url(),
            exception_ids_url: None,
            exception_item_ids: Vec::new(),
        }
    }
}

/// 图片渲染配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImageRenderConfig {
    /// 是否优先速度渲染（OptimizeSpeed），提升栅格化性能，可能略降画质
    #[serde(default)]
    pub optimize_speed: bool,
    /// 并发渲染许可数（0=自动，取 CPU 核心数）
    #[serde(default)]
    pub max_parallel: u32,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub resources: ResourcesConfig,
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    /// 上游服务配置
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 图片渲染配置
    #[serde(default)]
    pub image: ImageRenderConfig,
}

impl AppConfig {
    /// 未设置 RUST_LOG 时使用的日志过滤器
    pub fn log_filter(&self) -> String {
        let level = self.logging.level.trim();
        format!("xivcard_backend={level},tower_http={level}")
    }

    /// 从配置文件加载配置，支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        let builder = ConfigBuilder::builder()
            // 配置文件缺失时使用默认值
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_UPSTREAM__PRIVATE_KEY
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let defaults = serde_json::to_value(Self::default())
            .map_err(|e| ConfigError::Message(format!("默认配置序列化失败: {e}")))?;
        let merged = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                &defaults.to_string(),
                config::FileFormat::Json,
            ))
            .add_source(builder)
            .build()?;

        merged.try_deserialize()
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 获取配置文件路径
    fn get_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取资源文件夹路径
    pub fn resources_path(&self) -> PathBuf {
        PathBuf::from(&self.resources.base_path)
    }

    /// 获取字体文件夹路径
    pub fn fonts_path(&self) -> PathBuf {
        PathBuf::from(&self.resources.fonts_dir)
    }

    /// 并发渲染许可数（0 时取 CPU 核心数）
    pub fn render_permits(&self) -> usize {
        match self.image.max_parallel as usize {
            0 => num_cpus::get(),
            m => m,
        }
    }

    /// 构建渲染引擎配置（引擎内部不访问全局配置）
    pub fn card_config(&self) -> CardConfig {
        CardConfig {
            resources_dir: self.resources_path(),
            fonts_dir: self.fonts_path(),
            character_api_base: self.upstream.character_api_base.clone(),
            private_key: self.upstream.private_key.clone(),
            mounts_url: self.upstream.mounts_url.clone(),
            minions_url: self.upstream.minions_url.clone(),
            exception_ids_url: self.upstream.exception_ids_url.clone(),
            exception_item_ids: self.upstream.exception_item_ids.clone(),
            optimize_speed: self.image.optimize_speed,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3940,
            },
            resources: ResourcesConfig {
                base_path: "./resources".to_string(),
                fonts_dir: ResourcesConfig::default_fonts_dir(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            api: ApiConfig {
                prefix: "/api/v1".to_string(),
            },
            upstream: UpstreamConfig::default(),
            image: ImageRenderConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn card_config_carries_upstream_and_resources() {
        let mut cfg = AppConfig::default();
        cfg.upstream.private_key = Some("k".to_string());
        cfg.upstream.exception_item_ids = vec![10, 20];
        let card = cfg.card_config();
        assert_eq!(card.private_key.as_deref(), Some("k"));
        assert_eq!(card.exception_item_ids, vec![10, 20]);
        assert_eq!(card.resources_dir, cfg.resources_path());
    }

    #[test]
    fn log_filter_follows_configured_level() {
        let mut cfg = AppConfig::default();
        assert_eq!(cfg.log_filter(), "xivcard_backend=info,tower_http=info");
        cfg.logging.level = "debug".to_string();
        assert_eq!(cfg.log_filter(), "xivcard_backend=debug,tower_http=debug");
    }

    #[test]
    fn render_permits_defaults_to_cpu_count() {
        let cfg = AppConfig::default();
        assert!(cfg.render_permits() >= 1);
    }
}
