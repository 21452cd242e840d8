use std::sync::Arc;
use std::time::Instant;

use chrono::Datelike;
use resvg::usvg::fontdb;
use tokio::task::JoinError;
use tokio_util::task::AbortOnDropHandle;

use super::CardConfig;
use super::assets::{AssetBundle, AssetCache};
use super::canvas::{
    Anchor, CardCanvas, Color, TextStyle, load_font_database, rasterize_png_async,
};
use super::fetcher::{DependentAssets, fetch_character, fetch_dependents};
use super::jobs::{
    DEFAULT_ACTIVE_UNLOCK_ID, JOB_ICON_SLOTS, LEVEL_ROWS, STATIC_JOB_ICONS, column_steps,
};
use super::layout::{CARD_LAYOUT, CardLayout, Rect};
use super::loader::{
    ImageAsset, ResourceLoader, decode_data_uri, load_local_image, load_remote_image,
};
use super::models::CharacterProfile;
use super::stats::{
    average_item_level, completion_percentage, displayed_level, resolve_class_or_job_icon,
};
use super::types::{CardStrings, CustomImage, Language, RenderRequest};
use crate::error::AppError;

const COPYRIGHT_FONT: TextStyle = TextStyle::regular(11.0, Color::PANEL);
const SMALL: TextStyle = TextStyle::regular(18.0, Color::PRIMARY);
const MEDIUM: TextStyle = TextStyle::regular(30.0, Color::PRIMARY);
const SEMI_MEDIUM: TextStyle = TextStyle::regular(25.0, Color::WHITE);
const LARGE: TextStyle = TextStyle::semibold(45.0, Color::WHITE);

fn join_err(e: JoinError) -> AppError {
    AppError::Internal(format!("渲染子任务执行失败: {e}"))
}

/// 角色卡片生成器。
///
/// 持有资源缓存与字体库，可在多个请求间共享（`Arc<CardCreator<_>>`）。
pub struct CardCreator<L: ResourceLoader> {
    loader: Arc<L>,
    config: Arc<CardConfig>,
    assets: AssetCache<L>,
    font_db: Arc<fontdb::Database>,
    layout: CardLayout,
}

impl<L: ResourceLoader> CardCreator<L> {
    /// 创建生成器并加载字体目录中的字体
    pub fn new(loader: Arc<L>, config: CardConfig) -> Self {
        let font_db = load_font_database(&config.fonts_dir);
        Self::with_font_database(loader, config, font_db)
    }

    pub fn with_font_database(
        loader: Arc<L>,
        config: CardConfig,
        font_db: Arc<fontdb::Database>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            assets: AssetCache::new(loader.clone(), config.clone()),
            loader,
            config,
            font_db,
            layout: CARD_LAYOUT,
        }
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.layout.canvas_width, self.layout.canvas_height)
    }

    /// 确保资源已加载；可重复、并发调用
    pub async fn ensure_init(&self) -> Result<(), AppError> {
        self.assets.ensure_init().await.map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        self.assets.get().is_some()
    }

    /// 生成卡片 PNG（890×720）
    pub async fn create_card(&self, request: RenderRequest) -> Result<Vec<u8>, AppError> {
        let svg = self.compose_svg(request).await?;
        self.rasterize(svg).await
    }

    /// 栅格化已合成的卡片文档
    pub async fn rasterize(&self, svg: String) -> Result<Vec<u8>, AppError> {
        rasterize_png_async(svg, self.font_db.clone(), self.config.optimize_speed).await
    }

    /// 合成卡片 SVG 文档。
    ///
    /// 角色数据请求在绘制开始前发出，与数据无关的图层先绘制；
    /// 依赖图片（立绘、守护神、军衔、徽章）只在一个汇合点等待。
    /// 提前返回或调用方放弃时，尚未完成的拉取任务随句柄一起中止。
    pub async fn compose_svg(&self, request: RenderRequest) -> Result<String, AppError> {
        let bundle = self.assets.ensure_init().await?;
        let language = Language::resolve(request.language.as_deref());
        let strings = language.strings();
        let t0 = Instant::now();

        let primary = {
            let loader = self.loader.clone();
            let config = self.config.clone();
            let character_id = request.character_id.clone();
            AbortOnDropHandle::new(tokio::spawn(async move {
                let profile = Arc::new(
                    fetch_character(loader.as_ref(), &config, &character_id, language).await?,
                );
                let dependents = tokio::spawn(fetch_dependents(loader, profile.clone()));
                let dependents = AbortOnDropHandle::new(dependents);
                Ok::<_, AppError>((profile, dependents))
            }))
        };
        let custom = request.custom_image.map(|source| {
            let loader = self.loader.clone();
            AbortOnDropHandle::new(tokio::spawn(async move {
                load_custom_image(loader.as_ref(), source).await
            }))
        });

        let l = &self.layout;
        let mut canvas = CardCanvas::new(l.canvas_width, l.canvas_height)?;

        canvas.image(&bundle.background, l.base_background)?;
        if let Some(handle) = custom {
            let image = handle.await.map_err(join_err)??;
            canvas.image(&image, l.custom_background)?;
        }
        self.draw_panels(&mut canvas, &bundle)?;
        self.draw_static_labels(&mut canvas, strings)?;
        self.draw_static_images(&mut canvas, &bundle)?;
        let t_static = t0.elapsed();

        let (profile, dependents) = primary.await.map_err(join_err)??;
        let t_data = t0.elapsed();

        self.draw_header(&mut canvas, &bundle, &profile)?;
        self.draw_collections(&mut canvas, &bundle, &profile, strings)?;
        self.draw_info(&mut canvas, &profile, strings)?;
        self.draw_special_progress(&mut canvas, &profile, strings)?;
        self.draw_job_grid(&mut canvas, &bundle, &profile)?;

        let dependents = dependents.await.map_err(join_err)??;
        let t_join = t0.elapsed();
        self.draw_dependents(&mut canvas, &dependents)?;

        canvas.image(&bundle.item_level, l.item_level_icon)?;
        canvas.text(
            l.item_level_text_x,
            l.item_level_text_y,
            &average_item_level(&profile.gear, &bundle.exception_ids),
            SEMI_MEDIUM.with_fill(Color::GREY),
            Anchor::Start,
        )?;

        tracing::info!(
            "卡片合成: 角色={}, 语言={}, 静态图层={:?}, 等待数据={:?}, 等待依赖={:?}, 总计={:?}",
            request.character_id,
            language.code(),
            t_static,
            t_data - t_static,
            t_join - t_data,
            t0.elapsed()
        );
        canvas.finish()
    }

    fn draw_panels(&self, canvas: &mut CardCanvas, bundle: &AssetBundle) -> Result<(), AppError> {
        let l = &self.layout;
        canvas.image(&bundle.header, l.header_bar)?;
        for panel in [
            l.mounts_panel,
            l.minions_panel,
            l.info_panel,
            l.special_panel,
            l.jobs_panel,
        ] {
            canvas.rect(panel, Color::PANEL)?;
        }
        Ok(())
    }

    fn draw_static_labels(
        &self,
        canvas: &mut CardCanvas,
        strings: &CardStrings,
    ) -> Result<(), AppError> {
        let l = &self.layout;
        let labels = [
            (strings.race_and_clan, l.info_small_y),
            (strings.guardian, l.info_small_y + l.info_spacing),
            (strings.elemental_level, l.elemental_label_y),
            (strings.resistance_rank, l.resistance_label_y),
        ];
        for (label, y) in labels {
            canvas.text(l.label_x, y, label, SMALL, Anchor::Start)?;
        }
        canvas.text(
            l.copyright_x,
            l.copyright_y,
            &copyright_line(chrono::Utc::now().year()),
            COPYRIGHT_FONT,
            Anchor::Start,
        )
    }

    fn draw_static_images(
        &self,
        canvas: &mut CardCanvas,
        bundle: &AssetBundle,
    ) -> Result<(), AppError> {
        let l = &self.layout;
        canvas.image(&bundle.shadow, l.item_level_shadow)?;
        canvas.image(&bundle.mount, l.mount_icon)?;
        canvas.image(&bundle.minion, l.minion_icon)?;
        for icon in STATIC_JOB_ICONS.iter() {
            canvas.image(
                bundle.job_icon(icon.key)?,
                Rect::square(icon.x, l.jobs_icon_y[icon.row], icon.size),
            )?;
        }
        Ok(())
    }

    fn draw_header(
        &self,
        canvas: &mut CardCanvas,
        bundle: &AssetBundle,
        profile: &CharacterProfile,
    ) -> Result<(), AppError> {
        let l = &self.layout;
        // 蓝魔法师的当前职业没有解锁 ID
        let unlock_id = profile.active_unlock_id.unwrap_or(DEFAULT_ACTIVE_UNLOCK_ID);
        canvas.image(bundle.job_background(unlock_id)?, l.job_background)?;

        if let Some(title) = &profile.title {
            canvas.text(l.header_center_x, l.header_title_y, title, MEDIUM, Anchor::Middle)?;
        }
        canvas.text(
            l.header_center_x,
            l.header_server_y,
            &format!("{} ({})", profile.server, profile.data_center),
            SMALL,
            Anchor::Middle,
        )?;
        canvas.text(
            l.header_center_x,
            l.header_name_y,
            &profile.name,
            LARGE,
            Anchor::Middle,
        )
    }

    fn draw_collections(
        &self,
        canvas: &mut CardCanvas,
        bundle: &AssetBundle,
        profile: &CharacterProfile,
        strings: &CardStrings,
    ) -> Result<(), AppError> {
        let l = &self.layout;
        let mounts = completion_percentage(profile.owned_mounts, bundle.mount_total);
        let minions = completion_percentage(profile.owned_minions, bundle.minion_total);
        let label = SMALL.with_fill(Color::GREY);

        canvas.text_followed_by(
            l.label_x,
            l.mount_minion_text_y,
            (&format!("{mounts}%"), SEMI_MEDIUM),
            5.0,
            (strings.mounts, label),
        )?;
        canvas.text_followed_by(
            l.minions_text_x,
            l.mount_minion_text_y,
            (&format!("{minions}%"), SEMI_MEDIUM),
            5.0,
            (strings.minions, label),
        )
    }

    fn draw_info(
        &self,
        canvas: &mut CardCanvas,
        profile: &CharacterProfile,
        strings: &CardStrings,
    ) -> Result<(), AppError> {
        let l = &self.layout;
        canvas.text(
            l.label_x,
            l.info_big_y,
            &format!("{}, {}", profile.race, profile.tribe),
            SEMI_MEDIUM,
            Anchor::Start,
        )?;
        canvas.text(
            l.label_x,
            l.info_big_y + l.info_spacing,
            &profile.guardian_deity.name,
            SEMI_MEDIUM,
            Anchor::Start,
        )?;

        if let Some(gc) = &profile.grand_company {
            canvas.text(
                l.label_x,
                l.info_small_y + l.info_spacing * 2.0,
                strings.grand_company,
                SMALL,
                Anchor::Start,
            )?;
            canvas.text(
                l.label_x,
                l.info_big_y + l.info_spacing * 2.0,
                &gc.name,
                SEMI_MEDIUM,
                Anchor::Start,
            )?;
        }

        if let Some(fc) = &profile.free_company {
            canvas.text(
                l.label_x,
                l.info_small_y + l.info_spacing * 3.0,
                strings.free_company,
                SMALL,
                Anchor::Start,
            )?;
            canvas.text_followed_by(
                l.label_x,
                l.info_big_y + l.info_spacing * 3.0,
                (&fc.name, SEMI_MEDIUM),
                10.0,
                (&format!("«{}»", fc.tag), SMALL.with_fill(Color::GREY)),
            )?;
        }
        Ok(())
    }

    fn draw_special_progress(
        &self,
        canvas: &mut CardCanvas,
        profile: &CharacterProfile,
        strings: &CardStrings,
    ) -> Result<(), AppError> {
        let l = &self.layout;
        canvas.text(
            l.label_x,
            l.elemental_value_y,
            &format!("{} {}", strings.eureka_level, profile.elemental_level),
            SEMI_MEDIUM,
            Anchor::Start,
        )?;
        canvas.text(
            l.label_x,
            l.resistance_value_y,
            &format!("{} {}", strings.bozja_rank, profile.resistance_rank),
            SEMI_MEDIUM,
            Anchor::Start,
        )
    }

    fn draw_job_grid(
        &self,
        canvas: &mut CardCanvas,
        bundle: &AssetBundle,
        profile: &CharacterProfile,
    ) -> Result<(), AppError> {
        let l = &self.layout;
        for slot in JOB_ICON_SLOTS.iter() {
            let key = resolve_class_or_job_icon(profile.class_jobs.get(slot.record_index), slot);
            canvas.image(
                bundle.job_icon(key)?,
                Rect::square(slot.x, l.jobs_icon_y[slot.row], 30.0),
            )?;
        }

        let level_style = SMALL.with_fill(Color::WHITE);
        for (row, columns) in LEVEL_ROWS.iter().enumerate() {
            for (steps, column) in column_steps(columns) {
                canvas.text(
                    l.job_text_x(steps),
                    l.jobs_text_y[row],
                    &displayed_level(&profile.class_jobs, column),
                    level_style,
                    Anchor::Middle,
                )?;
            }
        }
        Ok(())
    }

    fn draw_dependents(
        &self,
        canvas: &mut CardCanvas,
        dependents: &DependentAssets,
    ) -> Result<(), AppError> {
        let l = &self.layout;
        canvas.image(&dependents.portrait, l.portrait)?;
        canvas.image(&dependents.deity_icon, l.deity_icon)?;
        if let Some(rank) = &dependents.grand_company_rank {
            canvas.image(rank, l.gc_rank_icon)?;
        }
        if let Some(crest) = &dependents.crest {
            canvas.image(crest, l.crest)?;
        }
        Ok(())
    }
}

fn copyright_line(year: i32) -> String {
    format!("© 2010 - {year} SQUARE ENIX CO., LTD. All Rights Reserved")
}

async fn load_custom_image<L: ResourceLoader>(
    loader: &L,
    source: CustomImage,
) -> Result<ImageAsset, AppError> {
    match source {
        CustomImage::Path(path) => load_local_image(loader, &path).await,
        CustomImage::Url(url) => load_remote_image(loader, &url).await,
        CustomImage::DataUri(uri) => ImageAsset::from_encoded(&decode_data_uri(&uri)?)
            .map_err(|e| AppError::Validation(format!("自定义背景不是有效图片: {e}"))),
        CustomImage::Bytes(bytes) => ImageAsset::from_encoded(&bytes)
            .map_err(|e| AppError::Validation(format!("自定义背景不是有效图片: {e}"))),
    }
}
