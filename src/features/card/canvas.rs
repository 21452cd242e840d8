//! SVG 画布：文档顺序即绘制顺序，最终交给 resvg 栅格化并用 png crate 编码。

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use resvg::render;
use resvg::usvg::{self, Options as UsvgOptions, fontdb};
use tiny_skia::{Pixmap, Transform};
use tokio::task::spawn_blocking;

use super::layout::Rect;
use super::loader::ImageAsset;
use crate::error::AppError;

pub const MAIN_FONT_NAME: &str = "Source Sans Pro";
pub const FONT_FILES: [&str; 2] = ["SourceSansPro-Regular.ttf", "SourceSansPro-SemiBold.ttf"];

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::ImageRendererError(format!("SVG formatting error: {e}"))
}

/// 填充色（RGB + 不透明度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    pub const PRIMARY: Color = Color::rgb(178, 214, 249);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GREY: Color = Color::rgb(0x86, 0x86, 0x86);
    pub const PANEL: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        alpha: 0.5,
    };

    fn attrs(&self) -> String {
        let hex = format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b);
        if self.alpha >= 1.0 {
            format!(r#"fill="{hex}""#)
        } else {
            format!(r#"fill="{hex}" fill-opacity="{}""#, self.alpha)
        }
    }
}

/// 字号 + 字重 + 颜色
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub size: f32,
    pub weight: u16,
    pub fill: Color,
}

impl TextStyle {
    pub const fn regular(size: f32, fill: Color) -> Self {
        Self {
            size,
            weight: 400,
            fill,
        }
    }

    pub const fn semibold(size: f32, fill: Color) -> Self {
        Self {
            size,
            weight: 600,
            fill,
        }
    }

    pub const fn with_fill(self, fill: Color) -> Self {
        Self { fill, ..self }
    }

    fn attrs(&self) -> String {
        format!(
            r#"font-size="{}" font-weight="{}" {}"#,
            self.size,
            self.weight,
            self.fill.attrs()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
        }
    }
}

/// 按调用顺序追加元素的 SVG 文档
pub struct CardCanvas {
    svg: String,
    width: u32,
    height: u32,
}

impl CardCanvas {
    pub fn new(width: u32, height: u32) -> Result<Self, AppError> {
        let mut svg = String::with_capacity(512 * 1024);
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="{MAIN_FONT_NAME}">"#
        )
        .map_err(fmt_err)?;
        Ok(Self { svg, width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 拉伸绘制图片到目标矩形
    pub fn image(&mut self, asset: &ImageAsset, rect: Rect) -> Result<(), AppError> {
        writeln!(
            self.svg,
            r#"<image href="{}" x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none" />"#,
            asset.href(),
            rect.x,
            rect.y,
            rect.w,
            rect.h
        )
        .map_err(fmt_err)
    }

    pub fn rect(&mut self, rect: Rect, fill: Color) -> Result<(), AppError> {
        writeln!(
            self.svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" {} />"#,
            rect.x,
            rect.y,
            rect.w,
            rect.h,
            fill.attrs()
        )
        .map_err(fmt_err)
    }

    /// 单段文字，`y` 为基线
    pub fn text(
        &mut self,
        x: f32,
        y: f32,
        content: &str,
        style: TextStyle,
        anchor: Anchor,
    ) -> Result<(), AppError> {
        writeln!(
            self.svg,
            r#"<text x="{x}" y="{y}" text-anchor="{}" {}>{}</text>"#,
            anchor.as_str(),
            style.attrs(),
            escape_xml(content)
        )
        .map_err(fmt_err)
    }

    /// 两段同基线文字：第二段紧跟第一段的实际渲染宽度，再右移 `gap`。
    ///
    /// 宽度由 resvg 排版时测量，因此不需要在这里计算字形宽度。
    pub fn text_followed_by(
        &mut self,
        x: f32,
        y: f32,
        lead: (&str, TextStyle),
        gap: f32,
        trail: (&str, TextStyle),
    ) -> Result<(), AppError> {
        writeln!(
            self.svg,
            r#"<text x="{x}" y="{y}"><tspan {}>{}</tspan><tspan dx="{gap}" {}>{}</tspan></text>"#,
            lead.1.attrs(),
            escape_xml(lead.0),
            trail.1.attrs(),
            escape_xml(trail.0)
        )
        .map_err(fmt_err)
    }

    pub fn finish(mut self) -> Result<String, AppError> {
        writeln!(self.svg, "</svg>").map_err(fmt_err)?;
        Ok(self.svg)
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// 构建字体数据库：系统字体 + 字体目录中的 Source Sans Pro
pub fn load_font_database(fonts_dir: &Path) -> Arc<fontdb::Database> {
    let mut font_db = fontdb::Database::new();
    font_db.load_system_fonts();

    for file in FONT_FILES {
        let path = fonts_dir.join(file);
        if !path.is_file() {
            tracing::warn!("字体文件缺失: {}", path.display());
            continue;
        }
        if let Err(e) = font_db.load_font_file(&path) {
            tracing::error!("加载字体文件失败 '{}': {}", path.display(), e);
        }
    }
    font_db.set_sans_serif_family(MAIN_FONT_NAME);

    Arc::new(font_db)
}

/// 栅格化 SVG 并编码为 PNG
pub fn rasterize_png(
    svg_data: &str,
    font_db: Arc<fontdb::Database>,
    optimize_speed: bool,
) -> Result<Vec<u8>, AppError> {
    let t0 = std::time::Instant::now();

    let opts = UsvgOptions {
        fontdb: font_db,
        font_family: MAIN_FONT_NAME.to_string(),
        font_size: 18.0,
        languages: vec!["en".to_string()],
        shape_rendering: if optimize_speed {
            usvg::ShapeRendering::OptimizeSpeed
        } else {
            usvg::ShapeRendering::GeometricPrecision
        },
        text_rendering: if optimize_speed {
            usvg::TextRendering::OptimizeSpeed
        } else {
            usvg::TextRendering::OptimizeLegibility
        },
        image_rendering: if optimize_speed {
            usvg::ImageRendering::OptimizeSpeed
        } else {
            usvg::ImageRendering::OptimizeQuality
        },
        ..Default::default()
    };

    let tree = usvg::Tree::from_data(svg_data.as_bytes(), &opts)
        .map_err(|e| AppError::ImageRendererError(format!("Failed to parse SVG: {e}")))?;
    let t_parse = t0.elapsed();

    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| AppError::ImageRendererError("Failed to create pixmap".to_string()))?;
    render(&tree, Transform::default(), &mut pixmap.as_mut());
    let t_raster = t0.elapsed();

    let mut out = Vec::with_capacity((size.width() * size.height()) as usize);
    {
        let mut encoder = png::Encoder::new(&mut out, size.width(), size.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        if optimize_speed {
            encoder.set_compression(png::Compression::Fast);
            encoder.set_filter(png::FilterType::NoFilter);
        } else {
            encoder.set_compression(png::Compression::Default);
            encoder.set_filter(png::FilterType::Paeth);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| AppError::ImageRendererError(format!("PNG write_header error: {e}")))?;
        // tiny-skia 像素为预乘 alpha，PNG 需要非预乘
        let data: Vec<u8> = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        writer.write_image_data(&data).map_err(|e| {
            AppError::ImageRendererError(format!("PNG write_image_data error: {e}"))
        })?;
        writer
            .finish()
            .map_err(|e| AppError::ImageRendererError(format!("PNG finish error: {e}")))?;
    }
    let t_encode = t0.elapsed();

    tracing::info!(
        "卡片栅格化分段: 解析={:?}, 栅格化={:?}, 编码={:?}, 总计={:?}",
        t_parse,
        t_raster - t_parse,
        t_encode - t_raster,
        t_encode
    );
    Ok(out)
}

/// 在阻塞线程池中执行栅格化，避免占用异步运行时线程
pub async fn rasterize_png_async(
    svg: String,
    font_db: Arc<fontdb::Database>,
    optimize_speed: bool,
) -> Result<Vec<u8>, AppError> {
    spawn_blocking(move || rasterize_png(&svg, font_db, optimize_speed))
        .await
        .map_err(|e| AppError::Internal(format!("阻塞渲染任务执行失败: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::{Anchor, CardCanvas, Color, TextStyle, rasterize_png};
    use crate::features::card::layout::Rect;
    use resvg::usvg::fontdb;
    use std::sync::Arc;

    #[test]
    fn elements_are_emitted_in_call_order_and_escaped() {
        let mut canvas = CardCanvas::new(10, 10).expect("canvas");
        canvas
            .rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::PANEL)
            .expect("rect");
        canvas
            .text(
                1.0,
                5.0,
                "Race & <Clan>",
                TextStyle::regular(18.0, Color::PRIMARY),
                Anchor::Middle,
            )
            .expect("text");
        let svg = canvas.finish().expect("finish");

        let rect_at = svg.find("<rect").expect("rect");
        let text_at = svg.find("<text").expect("text");
        assert!(rect_at < text_at);
        assert!(svg.contains(r##"fill="#000000" fill-opacity="0.5""##));
        assert!(svg.contains("Race &amp; &lt;Clan&gt;"));
        assert!(svg.contains(r#"text-anchor="middle""#));
    }

    #[test]
    fn trailing_span_is_offset_by_gap() {
        let mut canvas = CardCanvas::new(10, 10).expect("canvas");
        let big = TextStyle::regular(25.0, Color::WHITE);
        canvas
            .text_followed_by(480.0, 156.0, ("10%", big), 5.0, ("Mounts", big.with_fill(Color::GREY)))
            .expect("run");
        let svg = canvas.finish().expect("finish");
        assert!(svg.contains(r#"<tspan dx="5""#));
        assert!(svg.contains("#868686"));
    }

    #[test]
    fn rasterizes_to_requested_size() {
        let mut canvas = CardCanvas::new(20, 12).expect("canvas");
        canvas
            .rect(Rect::new(0.0, 0.0, 20.0, 12.0), Color::WHITE)
            .expect("rect");
        let svg = canvas.finish().expect("finish");
        let png = rasterize_png(&svg, Arc::new(fontdb::Database::new()), true).expect("png");
        let decoded = image::load_from_memory(&png).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (20, 12));
        assert_eq!(decoded.to_rgba8().get_pixel(3, 3).0, [255, 255, 255, 255]);
    }
}
