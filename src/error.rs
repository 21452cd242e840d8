use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
#[derive(Error, Debug, Clone, utoipa::ToSchema)]
pub enum AppError {
    /// 网络请求错误（连接失败、读取中断等传输层问题）
    #[error("网络错误: {0}")]
    Network(String),

    /// 上游返回非成功状态码
    #[error("上游请求失败: {url} 返回 {status}")]
    Upstream { url: String, status: u16 },

    /// JSON 解析错误
    #[error("JSON 解析错误: {0}")]
    Json(String),

    /// 本地或远程图片资源无法读取/解码
    #[error("资源加载错误: {0}")]
    Asset(String),

    /// 资源缓存初始化失败
    #[error("资源初始化失败: {0}")]
    Init(String),

    /// 图像渲染错误
    #[error("图像渲染错误: {0}")]
    ImageRendererError(String),

    /// 参数校验错误
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// RFC7807 风格的错误响应（Problem Details）。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Bad Gateway")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 502)]
    pub status: u16,

    /// 人类可读的详细信息。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "UPSTREAM_ERROR")]
    pub code: String,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Network(_) | AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Json(_) => StatusCode::BAD_GATEWAY,
            AppError::Asset(_) => StatusCode::BAD_GATEWAY,
            AppError::Init(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ImageRendererError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::Network(_) => "UPSTREAM_ERROR",
            AppError::Upstream { .. } => "UPSTREAM_STATUS",
            AppError::Json(_) => "UPSTREAM_INVALID_DATA",
            AppError::Asset(_) => "ASSET_LOAD_FAILED",
            AppError::Init(_) => "ASSETS_NOT_READY",
            AppError::ImageRendererError(_) => "IMAGE_RENDER_FAILED",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::UNPROCESSABLE_ENTITY => "Validation Failed",
            StatusCode::BAD_GATEWAY => "Bad Gateway",
            StatusCode::SERVICE_UNAVAILABLE => "Service Unavailable",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: Some(self.to_string()),
            code: self.stable_code().to_string(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

// =============== Error conversions for common external errors ===============

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Asset(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Asset(err.to_string())
    }
}
