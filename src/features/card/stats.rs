//! 卡片上的派生数值：平均品级、职业图标选择、职业等级与收集完成度。

use std::collections::HashSet;

use super::jobs::{JobIconSlot, LevelColumn};
use super::models::{ClassJobRecord, GearSet, GearSlot};

/// 不计入平均品级的槽位（灵魂水晶）
pub const SOUL_CRYSTAL_SLOT: &str = "SoulCrystal";
pub const OFF_HAND_SLOT: &str = "Offhand";
pub const MAIN_HAND_SLOT: &str = "MainHand";
/// 平均品级固定按 12 件装备计算
pub const ITEM_LEVEL_DIVISOR: u32 = 12;

fn slot_contribution(slot: &GearSlot, exception_ids: &HashSet<u32>) -> u32 {
    match slot {
        GearSlot::Item { id, .. } if exception_ids.contains(id) => 1,
        GearSlot::Item { item_level, .. } => *item_level,
        GearSlot::Bare => 0,
    }
}

/// 平均品级，补零到 4 位。
///
/// 例外物品只计 1；没有副手时主手（若为物品）计两次。
pub fn average_item_level(gear: &GearSet, exception_ids: &HashSet<u32>) -> String {
    let mut sum: u32 = gear
        .iter()
        .filter(|(slot, _)| slot.as_str() != SOUL_CRYSTAL_SLOT)
        .map(|(_, piece)| slot_contribution(piece, exception_ids))
        .sum();

    if !gear.contains_key(OFF_HAND_SLOT) {
        if let Some(main_hand) = gear.get(MAIN_HAND_SLOT).filter(|p| p.is_item()) {
            sum += slot_contribution(main_hand, exception_ids);
        }
    }

    format!("{:04}", sum / ITEM_LEVEL_DIVISOR)
}

/// 选择槽位显示特职图标还是基础职业图标，返回图标键
pub fn resolve_class_or_job_icon(
    record: Option<&ClassJobRecord>,
    slot: &JobIconSlot,
) -> &'static str {
    let unlock_id = record.and_then(|r| r.unlock_id);
    if unlock_id == Some(slot.job_unlock_id) {
        slot.job_key
    } else {
        slot.class_key
    }
}

/// 按显示名线性查找等级，找不到时为 "0"
pub fn lookup_level(records: &[ClassJobRecord], name: &str) -> String {
    records
        .iter()
        .find(|r| r.name.as_deref() == Some(name))
        .map(|r| r.level.to_string())
        .unwrap_or_else(|| "0".to_string())
}

/// 等级列实际显示的文字（低于最低等级时显示 "0"）
pub fn displayed_level(records: &[ClassJobRecord], column: &LevelColumn) -> String {
    let level = lookup_level(records, column.name);
    if column.min_level == 0 {
        return level;
    }
    match level.parse::<u32>() {
        Ok(value) if value >= column.min_level => level,
        _ => "0".to_string(),
    }
}

/// 收集完成度百分比，向上取整；总数为 0 时为 0
pub fn completion_percentage(owned: usize, total: u32) -> u64 {
    if total == 0 {
        return 0;
    }
    let owned = owned as u64;
    let total = u64::from(total);
    (owned * 100).div_ceil(total)
}
