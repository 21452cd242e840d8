#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use axum::body::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{Value, json};
use xivcard_backend::AppError;
use xivcard_backend::features::card::jobs::{CLASS_JOB_ICON_KEYS, JOB_BACKGROUND_COUNT};
use xivcard_backend::features::card::{CardConfig, FetchResponse, ResourceLoader};

pub const CHARACTER_API: &str = "http://upstream.test";
pub const MOUNTS_URL: &str = "http://collect.test/mounts/";
pub const MINIONS_URL: &str = "http://collect.test/minions/";
pub const PORTRAIT_URL: &str = "http://img.test/portrait.png";
pub const DEITY_ICON_URL: &str = "http://upstream.test/i/deity.png";
pub const GC_RANK_URL: &str = "http://upstream.test/i/rank.png";
pub const CREST_URLS: [&str; 2] = ["http://img.test/crest-0.png", "http://img.test/crest-1.png"];

const COMMON_IMAGES: [&str; 6] = [
    "background.png",
    "minion.png",
    "mount.png",
    "ilvl-icon.png",
    "shadow.png",
    "char_info.png",
];

/// 内存资源加载器：URL 忽略查询串匹配，先消耗排队响应，再返回默认响应。
#[derive(Default)]
pub struct MemoryLoader {
    queued: Mutex<HashMap<String, VecDeque<FetchResponse>>>,
    defaults: Mutex<HashMap<String, FetchResponse>>,
    files: Mutex<HashMap<PathBuf, Bytes>>,
    hits: Mutex<HashMap<String, usize>>,
    requests: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

fn route_key(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

impl MemoryLoader {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn respond(&self, url: &str, status: u16, body: impl Into<Bytes>) {
        self.defaults.lock().unwrap().insert(
            route_key(url),
            FetchResponse {
                status,
                body: body.into(),
            },
        );
    }

    pub fn respond_json(&self, url: &str, value: &Value) {
        self.respond(url, 200, value.to_string());
    }

    /// 排队一次性响应，优先于默认响应
    pub fn enqueue(&self, url: &str, status: u16, body: impl Into<Bytes>) {
        self.queued
            .lock()
            .unwrap()
            .entry(route_key(url))
            .or_default()
            .push_back(FetchResponse {
                status,
                body: body.into(),
            });
    }

    pub fn put_file(&self, path: impl Into<PathBuf>, data: impl Into<Bytes>) {
        self.files.lock().unwrap().insert(path.into(), data.into());
    }

    pub fn remove_file(&self, path: &Path) {
        self.files.lock().unwrap().remove(path);
    }

    pub fn hits(&self, url: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .get(&route_key(url))
            .copied()
            .unwrap_or(0)
    }

    /// 所有以 `prefix` 开头的完整请求地址（含查询串）
    pub fn requests_to(&self, prefix: &str) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.starts_with(prefix))
            .cloned()
            .collect()
    }
}

impl ResourceLoader for MemoryLoader {
    async fn get(&self, url: &str) -> Result<FetchResponse, AppError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let key = route_key(url);
        self.requests.lock().unwrap().push(url.to_string());
        *self.hits.lock().unwrap().entry(key.clone()).or_default() += 1;

        if let Some(resp) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            return Ok(resp);
        }
        Ok(self
            .defaults
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or(FetchResponse {
                status: 404,
                body: Bytes::new(),
            }))
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes, AppError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::Asset(format!("missing file {}", path.display())))
    }
}

pub fn tiny_png(color: [u8; 4]) -> Bytes {
    let img = RgbaImage::from_pixel(2, 2, Rgba(color));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    Bytes::from(out)
}

/// 与 `ImageAsset` 嵌入 PNG 时一致的 data URI
pub fn png_data_uri(png: &[u8]) -> String {
    use base64::Engine as _;
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

pub fn encode_as(color: [u8; 4], format: ImageFormat) -> Bytes {
    let img = RgbaImage::from_pixel(4, 4, Rgba(color));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), format).unwrap();
    Bytes::from(out)
}

pub fn resources_dir() -> PathBuf {
    PathBuf::from("/virtual/resources")
}

pub fn card_config() -> CardConfig {
    CardConfig {
        resources_dir: resources_dir(),
        fonts_dir: PathBuf::from("/virtual/fonts"),
        character_api_base: CHARACTER_API.to_string(),
        mounts_url: MOUNTS_URL.to_string(),
        minions_url: MINIONS_URL.to_string(),
        optimize_speed: true,
        ..CardConfig::default()
    }
}

/// 写入本地图片资源与收集总数接口
pub fn seed_assets(loader: &MemoryLoader) {
    let base = resources_dir();
    let png = tiny_png([10, 20, 30, 255]);
    for name in COMMON_IMAGES {
        loader.put_file(base.join(name), png.clone());
    }
    for key in CLASS_JOB_ICON_KEYS {
        loader.put_file(
            base.join("class-jobs-icons").join(format!("{key}.png")),
            png.clone(),
        );
    }
    for n in 1..=JOB_BACKGROUND_COUNT {
        loader.put_file(
            base.join("class-jobs-backgrounds").join(format!("{n}.png")),
            png.clone(),
        );
    }
    loader.respond_json(MOUNTS_URL, &json!({ "count": 400 }));
    loader.respond_json(MINIONS_URL, &json!({ "count": 500 }));
}

pub fn character_url(id: &str) -> String {
    format!("{CHARACTER_API}/character/{id}")
}

/// 无大国防联军、无部队的最小角色
pub fn character_payload() -> Value {
    json!({
        "Character": {
            "Name": "Alisaie Leveilleur",
            "Server": "Twintania",
            "DC": "Light",
            "Portrait": PORTRAIT_URL,
            "Title": { "Name": "Warrior of Light" },
            "Race": { "Name": "Elezen" },
            "Tribe": { "Name": "Wildwood" },
            "GuardianDeity": { "Name": "Nymeia", "Icon": "/i/deity.png" },
            "GrandCompany": { "Company": null, "Rank": null },
            "FreeCompanyName": null,
            "GearSet": { "Gear": {
                "MainHand": { "Item": { "ID": 1, "LevelItem": 130 } },
                "SoulCrystal": { "Item": { "ID": 2, "LevelItem": 30 } },
                "Head": { "Item": { "ID": 3, "LevelItem": 130 } },
                "Waist": 0
            } },
            "ClassJobs": [
                { "Level": 90, "UnlockedState": { "ID": 19, "Name": "Paladin" } },
                { "Level": 50, "UnlockedState": { "ID": 3, "Name": "Marauder" } }
            ],
            "ActiveClassJob": { "UnlockedState": { "ID": 19 } },
            "ClassJobsElemental": { "Level": 60 },
            "ClassJobsBozjan": { "Level": 25 }
        },
        "FreeCompany": null,
        "Mounts": [{}, {}, {}],
        "Minions": [{}]
    })
}

pub fn with_grand_company(mut payload: Value) -> Value {
    payload["Character"]["GrandCompany"] = json!({
        "Company": { "Name": "Order of the Twin Adder[p]" },
        "Rank": { "Icon": "/i/rank.png" }
    });
    payload
}

pub fn with_free_company(mut payload: Value, name: &str, tag: &str) -> Value {
    payload["Character"]["FreeCompanyName"] = json!(name);
    payload["FreeCompany"] = json!({ "Tag": tag, "Crest": CREST_URLS });
    payload
}

/// 写入角色数据与依赖图片（立绘、守护神、军衔、徽章图层）
pub fn seed_character(loader: &MemoryLoader, id: &str, payload: &Value) {
    loader.respond_json(&character_url(id), payload);
    loader.respond(PORTRAIT_URL, 200, tiny_png([200, 150, 100, 255]));
    loader.respond(DEITY_ICON_URL, 200, tiny_png([1, 2, 3, 255]));
    loader.respond(GC_RANK_URL, 200, tiny_png([4, 5, 6, 255]));
    for url in CREST_URLS {
        loader.respond(url, 200, tiny_png([64, 64, 64, 255]));
    }
}

pub fn seeded_loader(id: &str, payload: &Value) -> MemoryLoader {
    let loader = MemoryLoader::default();
    seed_assets(&loader);
    seed_character(&loader, id, payload);
    loader
}
