//! 卡片版式常量。
//!
//! 所有坐标都在编译期由少量基础尺寸推导得到，渲染时只读取 [`CARD_LAYOUT`]。

/// 矩形区域（左上角 + 宽高）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub const fn square(x: f32, y: f32, size: f32) -> Self {
        Self::new(x, y, size, size)
    }
}

/// 基础尺寸
#[derive(Debug, Clone, Copy)]
pub struct BaseMeasurements {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// 右侧五个面板的高度（标题、坐骑/宠物、角色信息、特殊区域、职业）
    pub row_heights: [f32; 5],
    pub row_spacing: f32,
    pub half_width_spacing: f32,
    pub full_width: f32,
    pub start_x: f32,
    pub jobs_start_spacing: f32,
    pub jobs_row_spacing: f32,
    pub jobs_icon_to_text: f32,
    pub info_text_start_spacing: f32,
    pub info_text_big_offset: f32,
    pub info_text_spacing: f32,
    pub portrait_width: f32,
}

pub const BASE: BaseMeasurements = BaseMeasurements {
    canvas_width: 890,
    canvas_height: 720,
    row_heights: [120.0, 40.0, 215.0, 120.0, 175.0],
    row_spacing: 8.0,
    half_width_spacing: 10.0,
    full_width: 400.0,
    start_x: 464.0,
    jobs_start_spacing: 10.0,
    jobs_row_spacing: 8.0,
    jobs_icon_to_text: 45.0,
    info_text_start_spacing: 22.0,
    info_text_big_offset: 25.0,
    info_text_spacing: 50.0,
    portrait_width: 441.0,
};

/// 推导后的完整版式
#[derive(Debug, Clone, Copy)]
pub struct CardLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub row_y: [f32; 5],

    pub base_background: Rect,
    pub custom_background: Rect,
    pub header_bar: Rect,
    pub mounts_panel: Rect,
    pub minions_panel: Rect,
    pub info_panel: Rect,
    pub special_panel: Rect,
    pub jobs_panel: Rect,

    /// 左侧文字列
    pub label_x: f32,
    pub minions_text_x: f32,
    pub mount_minion_text_y: f32,
    pub mount_icon: Rect,
    pub minion_icon: Rect,

    pub header_center_x: f32,
    pub header_title_y: f32,
    pub header_name_y: f32,
    pub header_server_y: f32,
    pub job_background: Rect,

    pub info_small_y: f32,
    pub info_big_y: f32,
    pub info_spacing: f32,
    pub deity_icon: Rect,
    pub gc_rank_icon: Rect,
    pub crest: Rect,

    pub elemental_label_y: f32,
    pub elemental_value_y: f32,
    pub resistance_label_y: f32,
    pub resistance_value_y: f32,

    pub jobs_icon_y: [f32; 3],
    pub jobs_text_y: [f32; 3],
    pub jobs_text_start_x: f32,
    pub jobs_text_step: f32,

    pub copyright_x: f32,
    pub copyright_y: f32,

    pub portrait: Rect,
    pub item_level_shadow: Rect,
    pub item_level_icon: Rect,
    pub item_level_text_x: f32,
    pub item_level_text_y: f32,
}

impl CardLayout {
    pub const fn derive(b: &BaseMeasurements) -> Self {
        let width = b.canvas_width as f32;
        let height = b.canvas_height as f32;
        let [h1, h2, h3, h4, h5] = b.row_heights;

        let row1_y = 0.0;
        let row2_y = row1_y + h1 + b.row_spacing;
        let row3_y = row2_y + h2 + b.row_spacing;
        let row4_y = row3_y + h3 + b.row_spacing;
        let row5_y = row4_y + h4 + b.row_spacing;

        let half_width = b.full_width / 2.0 - b.half_width_spacing / 2.0;
        let start_x_half = b.start_x + half_width + b.half_width_spacing;
        let label_x = b.start_x + 16.0;

        let jobs_icon_1 = row5_y + b.jobs_start_spacing;
        let jobs_text_1 = jobs_icon_1 + b.jobs_icon_to_text;
        let jobs_icon_2 = jobs_text_1 + b.jobs_row_spacing;
        let jobs_text_2 = jobs_icon_2 + b.jobs_icon_to_text;
        let jobs_icon_3 = jobs_text_2 + b.jobs_row_spacing;
        let jobs_text_3 = jobs_icon_3 + b.jobs_icon_to_text;

        let info_small_y = row3_y + b.info_text_start_spacing;
        let portrait_w = b.portrait_width;

        Self {
            canvas_width: b.canvas_width,
            canvas_height: b.canvas_height,
            row_y: [row1_y, row2_y, row3_y, row4_y, row5_y],

            // 底图比画布高 2px，避免底边露出透明像素
            base_background: Rect::new(0.0, 0.0, width, height + 2.0),
            custom_background: Rect::new(0.0, 0.0, width, height),
            header_bar: Rect::new(0.0, row1_y, width, h1),
            mounts_panel: Rect::new(b.start_x, row2_y, half_width, h2),
            minions_panel: Rect::new(start_x_half, row2_y, half_width, h2),
            info_panel: Rect::new(b.start_x, row3_y, b.full_width, h3),
            special_panel: Rect::new(b.start_x, row4_y, b.full_width, h4),
            jobs_panel: Rect::new(b.start_x, row5_y, b.full_width, h5),

            label_x,
            minions_text_x: 685.0,
            mount_minion_text_y: row2_y + 28.0,
            mount_icon: Rect::square(620.0, row2_y + 5.0, 32.0),
            minion_icon: Rect::new(834.0, row2_y + 5.0, 19.0, 32.0),

            header_center_x: 450.0,
            header_title_y: 40.0,
            header_name_y: 80.0,
            header_server_y: 100.0,
            job_background: Rect::new(450.0, 4.0, b.full_width, 110.0),

            info_small_y,
            info_big_y: info_small_y + b.info_text_big_offset,
            info_spacing: b.info_text_spacing,
            deity_icon: Rect::square(805.0, row3_y + 69.0, 28.0),
            gc_rank_icon: Rect::square(799.0, row3_y + 110.0, 40.0),
            crest: Rect::square(800.0, row3_y + 162.0, 38.0),

            elemental_label_y: row4_y + 26.0,
            elemental_value_y: row4_y + 51.0,
            resistance_label_y: row4_y + 76.0,
            resistance_value_y: row4_y + 101.0,

            jobs_icon_y: [jobs_icon_1, jobs_icon_2, jobs_icon_3],
            jobs_text_y: [jobs_text_1, jobs_text_2, jobs_text_3],
            jobs_text_start_x: label_x + 15.0,
            jobs_text_step: 30.0,

            copyright_x: b.start_x,
            copyright_y: height - 5.0,

            portrait: Rect::new(0.0, row1_y + h1, portrait_w, height - h1),
            item_level_shadow: Rect::new(portrait_w - 143.0, 110.0, 170.0, 90.0),
            item_level_icon: Rect::new(portrait_w - 92.0, 132.0, 24.0, 27.0),
            item_level_text_x: portrait_w - 40.0,
            item_level_text_y: 155.0,
        }
    }

    /// 职业等级行中第 `steps` 个步进位置的文字中心 x
    pub fn job_text_x(&self, steps: u32) -> f32 {
        self.jobs_text_start_x + self.jobs_text_step * steps as f32
    }
}

pub const CARD_LAYOUT: CardLayout = CardLayout::derive(&BASE);

#[cfg(test)]
mod tests {
    use super::{CARD_LAYOUT, Rect};

    #[test]
    fn rows_stack_with_spacing() {
        assert_eq!(CARD_LAYOUT.row_y, [0.0, 128.0, 176.0, 399.0, 527.0]);
        assert_eq!(CARD_LAYOUT.minions_panel, Rect::new(669.0, 128.0, 195.0, 40.0));
    }

    #[test]
    fn derived_positions_match_card_geometry() {
        assert_eq!(CARD_LAYOUT.jobs_icon_y, [537.0, 590.0, 643.0]);
        assert_eq!(CARD_LAYOUT.jobs_text_y, [582.0, 635.0, 688.0]);
        assert_eq!(CARD_LAYOUT.info_small_y, 198.0);
        assert_eq!(CARD_LAYOUT.info_big_y, 223.0);
        assert_eq!(CARD_LAYOUT.elemental_label_y, 425.0);
        assert_eq!(CARD_LAYOUT.resistance_value_y, 500.0);
        assert_eq!(CARD_LAYOUT.deity_icon, Rect::square(805.0, 245.0, 28.0));
        assert_eq!(CARD_LAYOUT.crest, Rect::square(800.0, 338.0, 38.0));
        assert_eq!(CARD_LAYOUT.portrait, Rect::new(0.0, 120.0, 441.0, 600.0));
        assert_eq!(CARD_LAYOUT.item_level_icon.x, 349.0);
        assert_eq!(CARD_LAYOUT.copyright_y, 715.0);
        assert_eq!(CARD_LAYOUT.job_text_x(0), 495.0);
        assert_eq!(CARD_LAYOUT.job_text_x(11), 825.0);
    }
}
