//! 靈感圖片的 prompt 組裝
//!
//! 以表單輸入與後端回傳的單品做字串內插

use crate::domain::model::{Gender, Outfit, Prompt, StyleInspiration, COMPLETE_DRESS_LOOK};

/// 為搭配風格靈感的穿搭卡片建立圖片 prompt
pub fn inspiration_prompt(
    inspiration: &StyleInspiration,
    outfit: &Outfit,
    clothing_item: &str,
    color: &str,
    gender: Gender,
) -> Prompt {
    let top = outfit.displayable_top();
    let pants = outfit.pants.as_deref().unwrap_or("");
    let shoes = outfit.shoes.as_deref().filter(|s| !s.is_empty());

    let mut include = String::new();
    if let Some(top) = top {
        include.push_str(top);
        include.push_str(", ");
    }
    include.push_str(pants);
    if let Some(shoes) = shoes {
        include.push_str(", ");
        include.push_str(shoes);
    }

    Prompt::new(format!(
        "Fashion photograph, {} style. {}. Outfit based on {} in {}. Include: {}. \
         Photorealistic, full outfit visible, studio lighting.",
        inspiration.description.to_lowercase(),
        gender.model_label(),
        clothing_item,
        color,
        include
    ))
}

/// 加上變化標記，讓圖片服務產生新圖
pub fn variation_prompt(base: &Prompt, variation: u32) -> Prompt {
    Prompt::new(format!("{} Variation {}", base, variation))
}

/// 目前時間毫秒數取 0..1000
pub fn variation_seed() -> u32 {
    chrono::Utc::now().timestamp_millis().rem_euclid(1000) as u32
}

/// 大圖上方顯示的標題
pub fn outfit_title(outfit: &Outfit) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(top) = outfit.displayable_top() {
        parts.push(top);
    }
    if let Some(pants) = outfit
        .pants
        .as_deref()
        .filter(|p| !p.is_empty() && *p != COMPLETE_DRESS_LOOK)
    {
        parts.push(pants);
    }
    if let Some(shoes) = outfit.shoes.as_deref().filter(|s| !s.is_empty()) {
        parts.push(shoes);
    }

    if parts.is_empty() {
        "Full Image".to_string()
    } else {
        parts.join(", ")
    }
}
