use std::future::Future;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use base64::{Engine as _, engine::general_purpose::STANDARD as base64_engine};
use image::{ImageFormat, ImageReader, RgbaImage};

use crate::error::AppError;

/// 一次 GET 请求的结果（状态码 + 响应体）
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 资源加载抽象：远程 GET 与本地文件读取。
///
/// 渲染引擎只依赖该 trait，生产环境由 `crate::http::HttpLoader` 实现，测试使用内存实现。
/// 传输层错误直接返回 `Err`；非 2xx 状态码作为 `Ok(FetchResponse)` 返回，由调用方决定是否重试。
pub trait ResourceLoader: Send + Sync + 'static {
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchResponse, AppError>> + Send;

    fn read_file(&self, path: &Path) -> impl Future<Output = Result<Bytes, AppError>> + Send;
}

/// GET 并要求 2xx，否则返回 `AppError::Upstream`
pub async fn get_success<L: ResourceLoader>(loader: &L, url: &str) -> Result<Bytes, AppError> {
    let response = loader.get(url).await?;
    if !response.is_success() {
        return Err(AppError::Upstream {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(response.body)
}

/// 可直接作为 data URI 嵌入画布的格式
const EMBEDDABLE_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// 已校验的图片资源，以 Data URI 形式直接嵌入画布。
#[derive(Debug, Clone)]
pub struct ImageAsset {
    href: Arc<str>,
    width: u32,
    height: u32,
}

impl ImageAsset {
    /// 从编码后的图片字节构建。
    ///
    /// PNG/JPEG/GIF/WebP 原样嵌入，只读取头部尺寸；其它格式（BMP、TIFF 等）
    /// 栅格化器无法解码，完整解码后重新编码为 PNG。
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, AppError> {
        let format = image::guess_format(bytes)?;
        if !EMBEDDABLE_FORMATS.contains(&format) {
            let decoded = image::load_from_memory_with_format(bytes, format)?;
            return Self::from_rgba(&decoded.to_rgba8());
        }
        let (width, height) = ImageReader::with_format(Cursor::new(bytes), format).into_dimensions()?;
        let mime = format.to_mime_type();
        let b64 = base64_engine.encode(bytes);
        Ok(Self {
            href: Arc::from(format!("data:{mime};base64,{b64}")),
            width,
            height,
        })
    }

    /// 将像素缓冲编码为 PNG 后构建
    pub fn from_rgba(pixels: &RgbaImage) -> Result<Self, AppError> {
        let mut out = Vec::new();
        pixels.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        Self::from_encoded(&out)
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// 读取远程图片并校验格式
pub async fn load_remote_image<L: ResourceLoader>(
    loader: &L,
    url: &str,
) -> Result<ImageAsset, AppError> {
    let bytes = get_success(loader, url).await?;
    ImageAsset::from_encoded(&bytes).map_err(|e| AppError::Asset(format!("{url}: {e}")))
}

/// 读取本地图片并校验格式
pub async fn load_local_image<L: ResourceLoader>(
    loader: &L,
    path: &Path,
) -> Result<ImageAsset, AppError> {
    let bytes = loader.read_file(path).await?;
    ImageAsset::from_encoded(&bytes)
        .map_err(|e| AppError::Asset(format!("{}: {e}", path.display())))
}

/// 解码 `data:` URI（仅支持 base64 编码）
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, AppError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| AppError::Validation("不是 data URI".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::Validation("data URI 缺少数据段".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(AppError::Validation(
            "data URI 仅支持 base64 编码".to_string(),
        ));
    }
    base64_engine
        .decode(payload.trim())
        .map_err(|e| AppError::Validation(format!("data URI base64 解码失败: {e}")))
}
