//! 推薦結果的純文字輸出

use crate::core::sequencer::{ImageSlot, SlotStatus};
use crate::core::session::{OutfitCard, RecommendationBoard};
use crate::domain::model::{ColorPaletteItem, Theme};
use std::fmt::Write;

pub const SWATCH: &str = "■";
pub const GENERATING_MESSAGE: &str = "Generating outfit visualization...";
pub const FAILED_MESSAGE: &str = "Failed to generate image.";

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub theme: Theme,
    /// 色票與標題是否使用 ANSI 顏色
    pub ansi: bool,
    pub show_images: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            ansi: false,
            show_images: true,
        }
    }
}

/// 解析 `#RGB` 或 `#RRGGBB`，`#` 可省略
pub fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };

    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

pub fn render_board(board: &RecommendationBoard, options: &RenderOptions) -> String {
    let mut out = String::new();
    let subject = board.heading_subject();

    let _ = writeln!(
        out,
        "{}",
        heading(&format!("🎨 Color Palette for \"{}\"", subject), options)
    );
    for item in &board.palette {
        let _ = writeln!(out, "{}", render_swatch(item, options));
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}",
        heading(
            &format!("👕 Outfit Recommendations for \"{}\"", subject),
            options
        )
    );
    for (idx, card) in board.cards.iter().enumerate() {
        out.push_str(&render_card(idx, card, options));
    }

    out
}

pub fn render_swatch(item: &ColorPaletteItem, options: &RenderOptions) -> String {
    let swatch = match (options.ansi, parse_hex(&item.hex)) {
        (true, Some((r, g, b))) => format!("\x1b[38;2;{};{};{}m{}\x1b[0m", r, g, b, SWATCH),
        _ => SWATCH.to_string(),
    };
    format!("  {} {} ({})", swatch, item.name, item.hex)
}

pub fn render_card(idx: usize, card: &OutfitCard, options: &RenderOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  [{}] {}", idx + 1, card.title);

    if let Some(top) = card.outfit.displayable_top() {
        let _ = writeln!(out, "      Top:   {}", top);
    }
    let _ = writeln!(
        out,
        "      Pants: {}",
        card.outfit.pants.as_deref().unwrap_or("")
    );
    let _ = writeln!(
        out,
        "      Shoes: {}",
        card.outfit.shoes.as_deref().unwrap_or("")
    );

    if let Some(inspiration) = &card.inspiration {
        let _ = writeln!(out, "      Style Inspiration: {}", inspiration.description);
        if options.show_images {
            if let Some(slot) = &card.slot {
                let _ = writeln!(out, "      Image: {}", render_slot(slot));
            }
        }
    }

    out
}

/// 依圖片狀態顯示對應內容
pub fn render_slot(slot: &ImageSlot) -> String {
    match (slot.status(), slot.image_url()) {
        (SlotStatus::Success, Some(url)) => url.to_string(),
        (SlotStatus::Failed, _) => FAILED_MESSAGE.to_string(),
        (SlotStatus::Pending | SlotStatus::Loading, _) => GENERATING_MESSAGE.to_string(),
        (SlotStatus::Success, None) => String::new(),
    }
}

fn heading(text: &str, options: &RenderOptions) -> String {
    if !options.ansi {
        return text.to_string();
    }
    match options.theme {
        Theme::Dark => format!("\x1b[1;97m{}\x1b[0m", text),
        Theme::Light => format!("\x1b[1;30m{}\x1b[0m", text),
    }
}
