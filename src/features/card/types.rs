use std::path::PathBuf;

use axum::body::Bytes;
use serde::Deserialize;

/// 角色数据服务支持的语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ja,
    De,
    Fr,
}

impl Language {
    /// 解析语言代码，只接受精确的小写代码；其它值（包括空值）回退到英文
    pub fn resolve(code: Option<&str>) -> Self {
        match code {
            Some("en") | None => Language::En,
            Some("ja") => Language::Ja,
            Some("de") => Language::De,
            Some("fr") => Language::Fr,
            Some(other) => {
                tracing::warn!("不支持的语言代码 '{}'，回退到 en", other);
                Language::En
            }
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ja => "ja",
            Language::De => "de",
            Language::Fr => "fr",
        }
    }

    /// 卡片上的固定文案。只有英文与德文有译文，其余语言使用英文。
    pub fn strings(self) -> &'static CardStrings {
        match self {
            Language::De => &STRINGS_DE,
            _ => &STRINGS_EN,
        }
    }
}

/// 卡片固定文案
#[derive(Debug)]
pub struct CardStrings {
    pub race_and_clan: &'static str,
    pub guardian: &'static str,
    pub grand_company: &'static str,
    pub free_company: &'static str,
    pub elemental_level: &'static str,
    pub eureka_level: &'static str,
    pub resistance_rank: &'static str,
    pub bozja_rank: &'static str,
    pub mounts: &'static str,
    pub minions: &'static str,
}

static STRINGS_EN: CardStrings = CardStrings {
    race_and_clan: "Race & Clan",
    guardian: "Guardian",
    grand_company: "Grand Company",
    free_company: "Free Company",
    elemental_level: "Elemental Level",
    eureka_level: "Level",
    resistance_rank: "Resistance Rank",
    bozja_rank: "Rank",
    mounts: "Mounts",
    minions: "Minions",
};

static STRINGS_DE: CardStrings = CardStrings {
    race_and_clan: "Volk & Stamm",
    guardian: "Schutzgott",
    grand_company: "Staatliche Gesellschaft",
    free_company: "Freie Gesellschaft",
    elemental_level: "Das Verbotene Land Eureka",
    eureka_level: "Elementarstufe",
    resistance_rank: "Bozja-Südfront",
    bozja_rank: "Widerstandsstufe",
    mounts: "Reittiere",
    minions: "Begleiter",
};

/// 自定义背景图来源，绘制在底图与半透明面板之间（拉伸到 890×720）
#[derive(Debug, Clone)]
pub enum CustomImage {
    /// 本地文件
    Path(PathBuf),
    /// 远程地址
    Url(String),
    /// `data:image/...;base64,...`
    DataUri(String),
    /// 已编码的图片字节
    Bytes(Bytes),
}

impl CustomImage {
    /// 根据字符串前缀判断来源类型
    pub fn parse(source: &str) -> Self {
        if source.starts_with("data:") {
            CustomImage::DataUri(source.to_string())
        } else if source.starts_with("http://") || source.starts_with("https://") {
            CustomImage::Url(source.to_string())
        } else {
            CustomImage::Path(PathBuf::from(source))
        }
    }
}

/// 一次卡片渲染请求
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Lodestone 角色 ID（数字或字符串）
    pub character_id: String,
    pub custom_image: Option<CustomImage>,
    pub language: Option<String>,
}

impl RenderRequest {
    pub fn new(character_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            custom_image: None,
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_custom_image(mut self, image: CustomImage) -> Self {
        self.custom_image = Some(image);
        self
    }
}
