use std::collections::BTreeMap;

use reqwest::Url;
use serde::Deserialize;

use crate::error::AppError;

// ====================== 上游响应结构 ======================
//
// 只声明卡片用到的字段，与请求中的 columns 投影一一对应。

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CharacterResponse {
    pub character: CharacterPayload,
    #[serde(default)]
    pub free_company: Option<FreeCompanyPayload>,
    #[serde(default)]
    pub mounts: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minions: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CharacterPayload {
    pub name: String,
    pub server: String,
    #[serde(rename = "DC")]
    pub dc: String,
    pub portrait: String,
    #[serde(default)]
    pub title: Option<NamedPayload>,
    pub race: NamedPayload,
    pub tribe: NamedPayload,
    pub guardian_deity: GuardianDeityPayload,
    #[serde(default)]
    pub grand_company: Option<GrandCompanyPayload>,
    #[serde(default)]
    pub free_company_name: Option<String>,
    pub gear_set: GearSetPayload,
    #[serde(default)]
    pub class_jobs: Vec<ClassJobPayload>,
    #[serde(default)]
    pub active_class_job: Option<ActiveClassJobPayload>,
    #[serde(default)]
    pub class_jobs_elemental: Option<LevelPayload>,
    #[serde(default)]
    pub class_jobs_bozjan: Option<LevelPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamedPayload {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GuardianDeityPayload {
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GrandCompanyPayload {
    #[serde(default)]
    pub company: Option<NamedPayload>,
    #[serde(default)]
    pub rank: Option<IconPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IconPayload {
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FreeCompanyPayload {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub crest: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GearSetPayload {
    #[serde(default)]
    pub gear: BTreeMap<String, GearPiecePayload>,
}

/// 装备槽位：正常为物品对象，个别槽位可能是裸数字
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GearPiecePayload {
    Item {
        #[serde(rename = "Item")]
        item: GearItemPayload,
    },
    Bare(serde_json::Number),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GearItemPayload {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(default)]
    pub level_item: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClassJobPayload {
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub unlocked_state: Option<UnlockedStatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UnlockedStatePayload {
    #[serde(rename = "ID", default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActiveClassJobPayload {
    #[serde(default)]
    pub unlocked_state: Option<UnlockedStatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LevelPayload {
    #[serde(default)]
    pub level: Option<u32>,
}

// ====================== 领域模型 ======================

/// 装备槽位
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GearSlot {
    Item { id: u32, item_level: u32 },
    /// 上游以裸数字表示的槽位，不参与平均品级计算
    Bare,
}

impl GearSlot {
    pub fn is_item(&self) -> bool {
        matches!(self, GearSlot::Item { .. })
    }
}

pub type GearSet = BTreeMap<String, GearSlot>;

/// 单条职业记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassJobRecord {
    pub name: Option<String>,
    pub level: u32,
    pub unlock_id: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct GuardianDeity {
    pub name: String,
    pub icon_url: String,
}

#[derive(Debug, Clone)]
pub struct GrandCompany {
    pub name: String,
    pub rank_icon_url: String,
}

#[derive(Debug, Clone)]
pub struct FreeCompany {
    pub name: String,
    pub tag: String,
    /// 按绘制顺序排列的徽章图层
    pub crest_layers: Vec<String>,
}

/// 渲染所需的角色资料（已校验）
#[derive(Debug, Clone)]
pub struct CharacterProfile {
    pub name: String,
    pub title: Option<String>,
    pub server: String,
    pub data_center: String,
    pub race: String,
    pub tribe: String,
    pub guardian_deity: GuardianDeity,
    pub grand_company: Option<GrandCompany>,
    pub free_company: Option<FreeCompany>,
    pub gear: GearSet,
    pub class_jobs: Vec<ClassJobRecord>,
    pub active_unlock_id: Option<u32>,
    pub elemental_level: u32,
    pub resistance_rank: u32,
    pub portrait_url: String,
    pub owned_mounts: usize,
    pub owned_minions: usize,
}

impl CharacterResponse {
    /// 转换为领域模型。图标等相对地址以 `asset_base` 补全。
    pub fn into_profile(self, asset_base: &Url) -> Result<CharacterProfile, AppError> {
        let CharacterResponse {
            character,
            free_company,
            mounts,
            minions,
        } = self;

        let absolute = |raw: &str| resolve_asset_url(asset_base, raw);

        let grand_company = match character.grand_company {
            Some(GrandCompanyPayload {
                company: Some(NamedPayload { name: Some(name) }),
                rank,
            }) => {
                let icon = rank.and_then(|r| r.icon).ok_or_else(|| {
                    AppError::Json("角色有大国防联军但缺少军衔图标".to_string())
                })?;
                Some(GrandCompany {
                    name: name.replace("[p]", ""),
                    rank_icon_url: absolute(&icon)?,
                })
            }
            _ => None,
        };

        let free_company = match character.free_company_name {
            Some(name) => {
                let (tag, layers) = match free_company {
                    Some(fc) => (fc.tag.unwrap_or_default(), fc.crest.unwrap_or_default()),
                    None => (String::new(), Vec::new()),
                };
                let crest_layers = layers
                    .iter()
                    .map(|layer| absolute(layer))
                    .collect::<Result<Vec<_>, _>>()?;
                Some(FreeCompany {
                    name,
                    tag,
                    crest_layers,
                })
            }
            None => None,
        };

        let gear = character
            .gear_set
            .gear
            .into_iter()
            .map(|(slot, piece)| {
                let slot_value = match piece {
                    GearPiecePayload::Item { item } => GearSlot::Item {
                        id: item.id,
                        item_level: item.level_item,
                    },
                    GearPiecePayload::Bare(_) => GearSlot::Bare,
                };
                (slot, slot_value)
            })
            .collect();

        let class_jobs = character
            .class_jobs
            .into_iter()
            .map(|cj| {
                let (unlock_id, name) = match cj.unlocked_state {
                    Some(state) => (state.id, state.name),
                    None => (None, None),
                };
                ClassJobRecord {
                    name,
                    level: cj.level.unwrap_or(0),
                    unlock_id,
                }
            })
            .collect();

        let active_unlock_id = character
            .active_class_job
            .and_then(|a| a.unlocked_state)
            .and_then(|s| s.id);

        Ok(CharacterProfile {
            name: character.name,
            title: character.title.and_then(|t| t.name),
            server: character.server,
            data_center: character.dc,
            race: character.race.name.unwrap_or_default(),
            tribe: character.tribe.name.unwrap_or_default(),
            guardian_deity: GuardianDeity {
                name: character.guardian_deity.name,
                icon_url: absolute(&character.guardian_deity.icon)?,
            },
            grand_company,
            free_company,
            gear,
            class_jobs,
            active_unlock_id,
            elemental_level: character
                .class_jobs_elemental
                .and_then(|l| l.level)
                .unwrap_or(0),
            resistance_rank: character
                .class_jobs_bozjan
                .and_then(|l| l.level)
                .unwrap_or(0),
            portrait_url: absolute(&character.portrait)?,
            owned_mounts: mounts.map(|m| m.len()).unwrap_or(0),
            owned_minions: minions.map(|m| m.len()).unwrap_or(0),
        })
    }
}

/// 上游图标常以 `/i/...` 相对路径给出，需要补全为绝对地址
fn resolve_asset_url(base: &Url, raw: &str) -> Result<String, AppError> {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Ok(raw.to_string());
    }
    base.join(raw)
        .map(|u| u.to_string())
        .map_err(|e| AppError::Json(format!("无法解析资源地址 '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::{CharacterResponse, GearSlot};
    use reqwest::Url;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("http://127.0.0.1:5002/").expect("url")
    }

    fn payload() -> serde_json::Value {
        json!({
            "Character": {
                "Name": "Alisaie Leveilleur",
                "Server": "Twintania",
                "DC": "Light",
                "Portrait": "https://img.example/portrait.jpg",
                "Title": { "Name": null },
                "Race": { "Name": "Elezen" },
                "Tribe": { "Name": "Wildwood" },
                "GuardianDeity": { "Name": "Nymeia", "Icon": "/i/061000/061601.png" },
                "GrandCompany": { "Company": { "Name": "Order of the Twin Adder[p]" }, "Rank": { "Icon": "/i/083000/083601.png" } },
                "FreeCompanyName": null,
                "GearSet": { "Gear": {
                    "MainHand": { "Item": { "ID": 1, "LevelItem": 130 } },
                    "SoulCrystal": { "Item": { "ID": 2, "LevelItem": 30 } },
                    "Waist": 0
                } },
                "ClassJobs": [
                    { "Level": 80, "UnlockedState": { "ID": 19, "Name": "Paladin" } },
                    { "Level": 0, "UnlockedState": { "ID": null, "Name": null } }
                ],
                "ActiveClassJob": { "UnlockedState": { "ID": null } },
                "ClassJobsElemental": { "Level": 60 },
                "ClassJobsBozjan": { "Level": null }
            },
            "FreeCompany": null,
            "Mounts": [{}, {}, {}],
            "Minions": null
        })
    }

    #[test]
    fn converts_payload_and_resolves_relative_icons() {
        let resp: CharacterResponse = serde_json::from_value(payload()).expect("parse");
        let profile = resp.into_profile(&base()).expect("convert");

        assert_eq!(profile.data_center, "Light");
        assert!(profile.title.is_none());
        assert_eq!(
            profile.guardian_deity.icon_url,
            "http://127.0.0.1:5002/i/061000/061601.png"
        );
        let gc = profile.grand_company.expect("grand company");
        assert_eq!(gc.name, "Order of the Twin Adder");
        assert!(profile.free_company.is_none());
        assert_eq!(profile.gear.get("Waist"), Some(&GearSlot::Bare));
        assert_eq!(
            profile.gear.get("MainHand"),
            Some(&GearSlot::Item {
                id: 1,
                item_level: 130
            })
        );
        assert_eq!(profile.class_jobs[1].unlock_id, None);
        assert_eq!(profile.active_unlock_id, None);
        assert_eq!(profile.elemental_level, 60);
        assert_eq!(profile.resistance_rank, 0);
        assert_eq!(profile.owned_mounts, 3);
        assert_eq!(profile.owned_minions, 0);
    }

    #[test]
    fn free_company_without_crest_has_no_layers() {
        let mut value = payload();
        value["Character"]["FreeCompanyName"] = json!("Scions");
        value["FreeCompany"] = json!({ "Tag": "SCN", "Crest": [] });
        value["Character"]["GrandCompany"] = json!({ "Company": null, "Rank": null });
        let resp: CharacterResponse = serde_json::from_value(value).expect("parse");
        let profile = resp.into_profile(&base()).expect("convert");

        assert!(profile.grand_company.is_none());
        let fc = profile.free_company.expect("free company");
        assert_eq!(fc.tag, "SCN");
        assert!(fc.crest_layers.is_empty());
    }
}
