use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared, try_join_all};
use serde::Deserialize;

use super::CardConfig;
use super::jobs::{CLASS_JOB_ICON_KEYS, JOB_BACKGROUND_COUNT};
use super::loader::{ImageAsset, ResourceLoader, get_success, load_local_image};
use crate::error::AppError;

/// 初始化完成后只读的资源集合
#[derive(Debug)]
pub struct AssetBundle {
    pub background: ImageAsset,
    pub minion: ImageAsset,
    pub mount: ImageAsset,
    pub item_level: ImageAsset,
    pub shadow: ImageAsset,
    pub header: ImageAsset,
    pub job_icons: HashMap<&'static str, ImageAsset>,
    /// 下标 = 解锁 ID - 1
    pub job_backgrounds: Vec<ImageAsset>,
    pub mount_total: u32,
    pub minion_total: u32,
    pub exception_ids: HashSet<u32>,
}

impl AssetBundle {
    pub fn job_icon(&self, key: &str) -> Result<&ImageAsset, AppError> {
        self.job_icons
            .get(key)
            .ok_or_else(|| AppError::Internal(format!("未知职业图标: {key}")))
    }

    /// 按解锁 ID（从 1 开始）取职业头图
    pub fn job_background(&self, unlock_id: u32) -> Result<&ImageAsset, AppError> {
        unlock_id
            .checked_sub(1)
            .and_then(|i| self.job_backgrounds.get(i as usize))
            .ok_or_else(|| AppError::Json(format!("角色数据中的解锁 ID {unlock_id} 没有对应的职业头图")))
    }
}

type InitFuture = Shared<BoxFuture<'static, Result<Arc<AssetBundle>, AppError>>>;

enum InitState {
    Idle,
    Loading { attempt: u64, future: InitFuture },
}

/// 惰性、幂等、并发安全的资源缓存。
///
/// 第一个调用者启动加载，加载期间到达的调用者等待同一次加载；成功结果永久缓存。
/// 失败不缓存：该次加载的所有等待者都得到同一个错误，之后的调用会重新加载。
pub struct AssetCache<L> {
    loader: Arc<L>,
    config: Arc<CardConfig>,
    ready: OnceLock<Arc<AssetBundle>>,
    state: Mutex<InitState>,
    attempts: AtomicU64,
}

impl<L: ResourceLoader> AssetCache<L> {
    pub fn new(loader: Arc<L>, config: Arc<CardConfig>) -> Self {
        Self {
            loader,
            config,
            ready: OnceLock::new(),
            state: Mutex::new(InitState::Idle),
            attempts: AtomicU64::new(0),
        }
    }

    /// 已初始化时直接返回
    pub fn get(&self) -> Option<Arc<AssetBundle>> {
        self.ready.get().cloned()
    }

    pub async fn ensure_init(&self) -> Result<Arc<AssetBundle>, AppError> {
        if let Some(bundle) = self.ready.get() {
            return Ok(bundle.clone());
        }

        let (attempt, future) = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| AppError::Internal("资源缓存锁已损坏".to_string()))?;
            if let Some(bundle) = self.ready.get() {
                return Ok(bundle.clone());
            }
            match &*state {
                InitState::Loading { attempt, future } => (*attempt, future.clone()),
                InitState::Idle => {
                    let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::info!("开始加载卡片资源（第 {} 次）", attempt);
                    let future = load_bundle(self.loader.clone(), self.config.clone())
                        .map(|r| r.map(Arc::new))
                        .boxed()
                        .shared();
                    *state = InitState::Loading {
                        attempt,
                        future: future.clone(),
                    };
                    (attempt, future)
                }
            }
        };

        let result = future.await;

        if let Ok(bundle) = &result {
            // 只有第一个完成者写入，其余 set 失败可以忽略
            let _ = self.ready.set(bundle.clone());
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::Internal("资源缓存锁已损坏".to_string()))?;
        if matches!(&*state, InitState::Loading { attempt: current, .. } if *current == attempt) {
            if let Err(e) = &result {
                tracing::error!("卡片资源加载失败（第 {} 次）: {}", attempt, e);
            }
            *state = InitState::Idle;
        }
        result
    }
}

const COMMON_IMAGES: [&str; 6] = [
    "background.png",
    "minion.png",
    "mount.png",
    "ilvl-icon.png",
    "shadow.png",
    "char_info.png",
];

#[derive(Debug, Deserialize)]
struct CollectionCount {
    count: u32,
}

async fn load_bundle<L: ResourceLoader>(
    loader: Arc<L>,
    config: Arc<CardConfig>,
) -> Result<AssetBundle, AppError> {
    let t0 = std::time::Instant::now();
    let base = config.resources_dir.as_path();
    let loader = loader.as_ref();

    let common = try_join_all(COMMON_IMAGES.iter().map(|name| {
        let path = base.join(name);
        async move { load_local_image(loader, &path).await }
    }));
    let icons = try_join_all(CLASS_JOB_ICON_KEYS.iter().map(|key| {
        let path = icon_path(base, key);
        async move { load_local_image(loader, &path).await }
    }));
    let backgrounds = try_join_all((1..=JOB_BACKGROUND_COUNT).map(|n| {
        let path = base.join("class-jobs-backgrounds").join(format!("{n}.png"));
        async move { load_local_image(loader, &path).await }
    }));
    let mounts = fetch_count(loader, &config.mounts_url);
    let minions = fetch_count(loader, &config.minions_url);
    let exceptions = load_exception_ids(loader, &config);

    let (common, icons, backgrounds, mount_total, minion_total, exception_ids) =
        tokio::try_join!(common, icons, backgrounds, mounts, minions, exceptions)
            .map_err(|e| AppError::Init(e.to_string()))?;

    let mut common = common.into_iter();
    let mut next = || {
        common
            .next()
            .ok_or_else(|| AppError::Init("公共图片数量不足".to_string()))
    };
    let bundle = AssetBundle {
        background: next()?,
        minion: next()?,
        mount: next()?,
        item_level: next()?,
        shadow: next()?,
        header: next()?,
        job_icons: CLASS_JOB_ICON_KEYS.iter().copied().zip(icons).collect(),
        job_backgrounds: backgrounds,
        mount_total,
        minion_total,
        exception_ids,
    };

    tracing::info!(
        "卡片资源加载完成: {} 个职业图标, {} 张职业头图, 坐骑 {}, 宠物 {}, 例外物品 {}, 耗时 {:?}",
        bundle.job_icons.len(),
        bundle.job_backgrounds.len(),
        bundle.mount_total,
        bundle.minion_total,
        bundle.exception_ids.len(),
        t0.elapsed()
    );
    Ok(bundle)
}

fn icon_path(base: &Path, key: &str) -> PathBuf {
    base.join("class-jobs-icons").join(format!("{key}.png"))
}

async fn fetch_count<L: ResourceLoader>(loader: &L, url: &str) -> Result<u32, AppError> {
    let body = get_success(loader, url).await?;
    let parsed: CollectionCount = serde_json::from_slice(&body)?;
    Ok(parsed.count)
}

/// 静态配置与远程列表的并集
async fn load_exception_ids<L: ResourceLoader>(
    loader: &L,
    config: &CardConfig,
) -> Result<HashSet<u32>, AppError> {
    let mut ids: HashSet<u32> = config.exception_item_ids.iter().copied().collect();
    if let Some(url) = config.exception_ids_url.as_deref() {
        let body = get_success(loader, url).await?;
        let remote: Vec<u32> = serde_json::from_slice(&body)?;
        ids.extend(remote);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::AssetBundle;
    use crate::error::AppError;
    use crate::features::card::loader::ImageAsset;
    use image::{Rgba, RgbaImage};
    use std::collections::{HashMap, HashSet};

    fn bundle() -> AssetBundle {
        let asset = ImageAsset::from_rgba(&RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255])))
            .expect("encode");
        AssetBundle {
            background: asset.clone(),
            minion: asset.clone(),
            mount: asset.clone(),
            item_level: asset.clone(),
            shadow: asset.clone(),
            header: asset.clone(),
            job_icons: HashMap::new(),
            job_backgrounds: vec![asset.clone(), asset],
            mount_total: 0,
            minion_total: 0,
            exception_ids: HashSet::new(),
        }
    }

    #[test]
    fn job_background_is_one_based() {
        let bundle = bundle();
        assert!(bundle.job_background(1).is_ok());
        assert!(bundle.job_background(2).is_ok());
    }

    #[test]
    fn unknown_unlock_id_is_bad_upstream_data() {
        let bundle = bundle();
        assert!(matches!(bundle.job_background(0), Err(AppError::Json(_))));
        assert!(matches!(bundle.job_background(3), Err(AppError::Json(_))));
    }
}
