//! 部队徽章合成：多图层叠加到 128×128 画布，随后把哨兵灰色抠成透明。

use futures_util::future::try_join_all;
use image::{DynamicImage, RgbaImage, imageops::FilterType};
use tokio::task::spawn_blocking;

use super::loader::{ImageAsset, ResourceLoader, get_success};
use crate::error::AppError;

pub const CREST_SIZE: u32 = 128;
/// 徽章素材中表示“背景”的灰色
pub const SENTINEL_GREY: [u8; 3] = [64, 64, 64];

/// 合成徽章；没有图层时返回 `None`
pub async fn composite<L: ResourceLoader>(
    loader: &L,
    layers: &[String],
) -> Result<Option<ImageAsset>, AppError> {
    if layers.is_empty() {
        return Ok(None);
    }

    let t0 = std::time::Instant::now();
    let encoded = try_join_all(layers.iter().map(|url| get_success(loader, url))).await?;

    let handle = spawn_blocking(move || -> Result<ImageAsset, AppError> {
        let decoded = encoded
            .iter()
            .map(|bytes| image::load_from_memory(bytes))
            .collect::<Result<Vec<_>, _>>()?;
        let mut merged = merge_layers(&decoded);
        apply_color_key(&mut merged);
        ImageAsset::from_rgba(&merged)
    });
    let crest = handle
        .await
        .map_err(|e| AppError::Internal(format!("徽章合成任务执行失败: {e}")))??;

    tracing::debug!("徽章合成完成: {} 层, 耗时 {:?}", layers.len(), t0.elapsed());
    Ok(Some(crest))
}

/// 按顺序以源覆盖方式叠加图层，每层缩放到 128×128
pub fn merge_layers(layers: &[DynamicImage]) -> RgbaImage {
    let mut surface = RgbaImage::new(CREST_SIZE, CREST_SIZE);
    for layer in layers {
        let rgba = if layer.width() == CREST_SIZE && layer.height() == CREST_SIZE {
            layer.to_rgba8()
        } else {
            image::imageops::resize(layer, CREST_SIZE, CREST_SIZE, FilterType::Triangle)
        };
        for (dst, src) in surface.pixels_mut().zip(rgba.pixels()) {
            dst.0 = source_over(dst.0, src.0);
        }
    }
    surface
}

/// 哨兵灰色像素整体置为 (0,0,0,0)；只对合成结果执行一次
pub fn apply_color_key(image: &mut RgbaImage) {
    for px in image.pixels_mut() {
        if px.0[..3] == SENTINEL_GREY {
            px.0 = [0, 0, 0, 0];
        }
    }
}

/// 非预乘 RGBA 的 source-over
fn source_over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(src[3]);
    let da = u32::from(dst[3]);
    if da == 0 || sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }

    let inv = 255 - sa;
    // 结果 alpha 放大 255 倍参与运算，最后统一四舍五入
    let out_a = sa * 255 + da * inv;
    let mut out = [0u8; 4];
    for c in 0..3 {
        let num = u32::from(src[c]) * sa * 255 + u32::from(dst[c]) * da * inv;
        out[c] = ((num + out_a / 2) / out_a) as u8;
    }
    out[3] = ((out_a + 127) / 255) as u8;
    out
}
