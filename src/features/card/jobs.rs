//! 职业网格：图标键、固定图标位置、按解锁状态切换的图标槽位以及三行等级列。

use ColumnGap::{Double, None as Start, Single};

/// 资源目录中全部职业图标的键（`class-jobs-icons/{key}.png`）
pub const CLASS_JOB_ICON_KEYS: [&str; 42] = [
    "alchemist",
    "armorer",
    "blacksmith",
    "carpenter",
    "culinarian",
    "goldsmith",
    "leatherworker",
    "weaver",
    "botanist",
    "fisher",
    "miner",
    "gladiator",
    "paladin",
    "marauder",
    "warrior",
    "darkknight",
    "gunbreaker",
    "conjurer",
    "whitemage",
    "scholar",
    "astrologian",
    "archer",
    "bard",
    "machinist",
    "dancer",
    "lancer",
    "dragoon",
    "pugilist",
    "monk",
    "rogue",
    "ninja",
    "samurai",
    "thaumaturge",
    "blackmage",
    "arcanist",
    "summoner",
    "redmage",
    "bluemage",
    "sage",
    "reaper",
    "viper",
    "pictomancer",
];

/// 职业头图数量，按解锁 ID（从 1 开始）索引
pub const JOB_BACKGROUND_COUNT: u32 = 42;

/// 角色没有当前职业解锁 ID 时使用的头图编号
pub const DEFAULT_ACTIVE_UNLOCK_ID: u32 = 36;

/// 与角色数据无关、总是固定绘制的图标
#[derive(Debug, Clone, Copy)]
pub struct StaticJobIcon {
    pub key: &'static str,
    pub x: f32,
    /// 0..=2
    pub row: usize,
    pub size: f32,
}

const fn fixed(key: &'static str, x: f32, row: usize) -> StaticJobIcon {
    StaticJobIcon {
        key,
        x,
        row,
        size: 30.0,
    }
}

pub const STATIC_JOB_ICONS: [StaticJobIcon; 24] = [
    fixed("darkknight", 540.0, 0),
    fixed("gunbreaker", 570.0, 0),
    fixed("scholar", 660.0, 0),
    fixed("astrologian", 690.0, 0),
    fixed("sage", 720.0, 0),
    fixed("pictomancer", 750.0, 1),
    fixed("machinist", 780.0, 0),
    fixed("dancer", 810.0, 0),
    fixed("samurai", 570.0, 1),
    fixed("reaper", 600.0, 1),
    fixed("viper", 630.0, 1),
    fixed("redmage", 720.0, 1),
    StaticJobIcon {
        key: "bluemage",
        x: 810.0,
        row: 1,
        size: 33.0,
    },
    fixed("carpenter", 480.0, 2),
    fixed("blacksmith", 510.0, 2),
    fixed("armorer", 540.0, 2),
    fixed("goldsmith", 570.0, 2),
    fixed("leatherworker", 600.0, 2),
    fixed("weaver", 630.0, 2),
    fixed("alchemist", 660.0, 2),
    fixed("culinarian", 690.0, 2),
    fixed("miner", 750.0, 2),
    fixed("botanist", 780.0, 2),
    fixed("fisher", 810.0, 2),
];

/// 基础职业/特职共用一格的图标槽位。
///
/// 当角色第 `record_index` 条职业记录的解锁 ID 等于 `job_unlock_id` 时显示特职图标，否则显示基础职业图标。
#[derive(Debug, Clone, Copy)]
pub struct JobIconSlot {
    pub record_index: usize,
    pub job_unlock_id: u32,
    pub class_key: &'static str,
    pub job_key: &'static str,
    pub x: f32,
    pub row: usize,
}

const fn slot(
    record_index: usize,
    job_unlock_id: u32,
    class_key: &'static str,
    job_key: &'static str,
    x: f32,
    row: usize,
) -> JobIconSlot {
    JobIconSlot {
        record_index,
        job_unlock_id,
        class_key,
        job_key,
        x,
        row,
    }
}

pub const JOB_ICON_SLOTS: [JobIconSlot; 9] = [
    slot(0, 19, "gladiator", "paladin", 480.0, 0),
    slot(1, 21, "marauder", "warrior", 510.0, 0),
    slot(4, 24, "conjurer", "whitemage", 630.0, 0),
    slot(13, 23, "archer", "bard", 750.0, 0),
    slot(9, 22, "lancer", "dragoon", 480.0, 1),
    slot(8, 20, "pugilist", "monk", 510.0, 1),
    slot(10, 30, "rogue", "ninja", 540.0, 1),
    slot(16, 25, "thaumaturge", "blackmage", 660.0, 1),
    slot(17, 27, "arcanist", "summoner", 690.0, 1),
];

/// 等级列与前一列的间距
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGap {
    /// 行首
    None,
    Single,
    Double,
}

impl ColumnGap {
    pub const fn steps(self) -> u32 {
        match self {
            ColumnGap::None => 0,
            ColumnGap::Single => 1,
            ColumnGap::Double => 2,
        }
    }
}

/// 一个等级列：按显示名查找等级，显示在该列中心
#[derive(Debug, Clone, Copy)]
pub struct LevelColumn {
    pub name: &'static str,
    pub gap: ColumnGap,
    /// 等级低于该值时显示 "0"
    pub min_level: u32,
}

const fn col(name: &'static str, gap: ColumnGap) -> LevelColumn {
    LevelColumn {
        name,
        gap,
        min_level: 0,
    }
}

pub const LEVEL_ROW_1: [LevelColumn; 11] = [
    col("Paladin", Start),
    col("Warrior", Single),
    col("Dark knight", Single),
    col("Gunbreaker", Single),
    col("White mage", Double),
    // 学者与秘术师共享等级，30 级以下视为未解锁
    LevelColumn {
        name: "Scholar",
        gap: Single,
        min_level: 30,
    },
    col("Astrologian", Single),
    col("Sage", Single),
    col("Bard", Single),
    col("Machinist", Single),
    col("Dancer", Single),
];

pub const LEVEL_ROW_2: [LevelColumn; 11] = [
    col("Dragoon", Start),
    col("Monk", Single),
    col("Ninja", Single),
    col("Samurai", Single),
    col("Reaper", Single),
    col("Viper", Single),
    col("Black mage", Single),
    col("Summoner", Single),
    col("Red mage", Single),
    col("Pictomancer", Single),
    col("Blue mage", Double),
];

pub const LEVEL_ROW_3: [LevelColumn; 11] = [
    col("Carpenter", Start),
    col("Blacksmith", Single),
    col("Armorer", Single),
    col("Goldsmith", Single),
    col("Leatherworker", Single),
    col("Weaver", Single),
    col("Alchemist", Single),
    col("Culinarian", Single),
    col("Miner", Double),
    col("Botanist", Single),
    col("Fisher", Single),
];

pub const LEVEL_ROWS: [&[LevelColumn]; 3] = [&LEVEL_ROW_1, &LEVEL_ROW_2, &LEVEL_ROW_3];

/// 计算一行中每列相对行首的步进数
pub fn column_steps(row: &[LevelColumn]) -> impl Iterator<Item = (u32, &LevelColumn)> + '_ {
    row.iter().scan(0u32, |acc, column| {
        *acc += column.gap.steps();
        Some((*acc, column))
    })
}
