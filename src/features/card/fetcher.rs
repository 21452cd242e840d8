use std::future::Future;
use std::sync::Arc;

use reqwest::Url;

use super::CardConfig;
use super::crest;
use super::loader::{FetchResponse, ImageAsset, ResourceLoader, load_remote_image};
use super::models::{CharacterProfile, CharacterResponse};
use super::types::Language;
use crate::error::AppError;

/// 角色请求的字段投影
pub const CHARACTER_COLUMNS: [&str; 23] = [
    "Character.ActiveClassJob.UnlockedState.ID",
    "Character.ClassJobs.*.Level",
    "Character.ClassJobs.*.UnlockedState.ID",
    "Character.ClassJobs.*.UnlockedState.Name",
    "Character.ClassJobsBozjan.Level",
    "Character.ClassJobsElemental.Level",
    "Character.DC",
    "Character.FreeCompanyName",
    "Character.GearSet.Gear",
    "Character.GrandCompany.Company.Name",
    "Character.GrandCompany.Rank.Icon",
    "Character.GuardianDeity.Name",
    "Character.GuardianDeity.Icon",
    "Character.Name",
    "Character.Portrait",
    "Character.Race.Name",
    "Character.Tribe.Name",
    "Character.Server",
    "Character.Title.Name",
    "FreeCompany.Crest",
    "FreeCompany.Tag",
    "Minions.*.dummy",
    "Mounts.*.dummy",
];

/// 非成功状态码的重试策略（不退避，传输层错误不重试）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// 失败后原样重发一次
    pub const RETRY_ONCE: RetryPolicy = RetryPolicy { max_attempts: 2 };

    pub async fn run<F, Fut>(&self, url: &str, mut send: F) -> Result<FetchResponse, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<FetchResponse, AppError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let response = send().await?;
            if response.is_success() {
                return Ok(response);
            }
            if attempt >= attempts {
                return Err(AppError::Upstream {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            tracing::warn!(
                "角色数据请求返回 {}，重试 ({}/{})",
                response.status,
                attempt + 1,
                attempts
            );
            attempt += 1;
        }
    }
}

/// 构造角色数据请求地址
pub fn character_url(
    config: &CardConfig,
    character_id: &str,
    language: Language,
) -> Result<Url, AppError> {
    let mut url = Url::parse(&config.character_api_base)
        .map_err(|e| AppError::Validation(format!("角色服务地址无效: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Validation("角色服务地址不能作为基地址".to_string()))?
        .pop_if_empty()
        .push("character")
        .push(character_id);
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("language", language.code())
            .append_pair("extended", "1")
            .append_pair("data", "FC,MIMO")
            .append_pair("columns", &CHARACTER_COLUMNS.join(","));
        if let Some(key) = config.private_key.as_deref().filter(|k| !k.is_empty()) {
            query.append_pair("private_key", key);
        }
    }
    Ok(url)
}

/// 拉取并校验角色资料
pub async fn fetch_character<L: ResourceLoader>(
    loader: &L,
    config: &CardConfig,
    character_id: &str,
    language: Language,
) -> Result<CharacterProfile, AppError> {
    if character_id.trim().is_empty() {
        return Err(AppError::Validation("角色 ID 不能为空".to_string()));
    }
    let url = character_url(config, character_id, language)?;
    let t0 = std::time::Instant::now();
    let response = RetryPolicy::RETRY_ONCE
        .run(url.as_str(), || loader.get(url.as_str()))
        .await?;
    let parsed: CharacterResponse = serde_json::from_slice(&response.body)?;
    let profile = parsed.into_profile(&url)?;
    tracing::info!("角色 {} 数据获取完成，耗时 {:?}", character_id, t0.elapsed());
    Ok(profile)
}

/// 依赖角色资料的图片资源
#[derive(Debug, Clone)]
pub struct DependentAssets {
    pub portrait: ImageAsset,
    pub deity_icon: ImageAsset,
    pub grand_company_rank: Option<ImageAsset>,
    pub crest: Option<ImageAsset>,
}

/// 并发拉取立绘、守护神图标、军衔图标与部队徽章；任一失败即整体失败
pub async fn fetch_dependents<L: ResourceLoader>(
    loader: Arc<L>,
    profile: Arc<CharacterProfile>,
) -> Result<DependentAssets, AppError> {
    let portrait = load_remote_image(loader.as_ref(), &profile.portrait_url);
    let deity_icon = load_remote_image(loader.as_ref(), &profile.guardian_deity.icon_url);
    let grand_company_rank = async {
        match &profile.grand_company {
            Some(gc) => load_remote_image(loader.as_ref(), &gc.rank_icon_url)
                .await
                .map(Some),
            None => Ok(None),
        }
    };
    let crest_layers = async {
        match &profile.free_company {
            Some(fc) => crest::composite(loader.as_ref(), &fc.crest_layers).await,
            None => Ok(None),
        }
    };

    let (portrait, deity_icon, grand_company_rank, crest) =
        tokio::try_join!(portrait, deity_icon, grand_company_rank, crest_layers)?;
    Ok(DependentAssets {
        portrait,
        deity_icon,
        grand_company_rank,
        crest,
    })
}
