/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// 启动检查模块
pub mod startup;

/// 功能聚合模块
pub mod features;

/// 应用状态聚合模块
pub mod state;

/// HTTP Client 复用与资源加载器
pub mod http;

/// OpenAPI 文档
pub mod openapi;

/// 路由组装
pub mod app;

// 导出常用类型供外部使用
pub use config::AppConfig;
pub use error::AppError;
