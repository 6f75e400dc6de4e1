use crate::config::preferences::Preferences;
use crate::domain::model::{Gender, RecommendationRequest};
use crate::utils::error::{Result, StyloError};

pub const MAX_STYLES: usize = 3;

/// 推薦表單狀態
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationForm {
    pub clothing_item: String,
    pub color: String,
    pub current_style_input: String,
    pub gender: Gender,
    selected_styles: Vec<String>,
}

impl RecommendationForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從已保存的偏好設定帶入性別與風格
    pub fn from_preferences(preferences: &Preferences) -> Self {
        let mut form = Self {
            gender: preferences.gender,
            ..Self::default()
        };
        for style in &preferences.styles {
            form.current_style_input = style.clone();
            form.add_style();
        }
        form.current_style_input.clear();
        form
    }

    pub fn selected_styles(&self) -> &[String] {
        &self.selected_styles
    }

    pub fn can_add_style(&self) -> bool {
        self.selected_styles.len() < MAX_STYLES
    }

    /// 加入去除空白後的風格輸入；空白、重複或已滿時不做事。回傳是否有加入
    pub fn add_style(&mut self) -> bool {
        let style = self.current_style_input.trim();
        if style.is_empty()
            || !self.can_add_style()
            || self.selected_styles.iter().any(|s| s == style)
        {
            return false;
        }

        self.selected_styles.push(style.to_string());
        self.current_style_input.clear();
        true
    }

    pub fn remove_style(&mut self, style: &str) -> bool {
        let before = self.selected_styles.len();
        self.selected_styles.retain(|s| s != style);
        self.selected_styles.len() != before
    }

    pub fn clear_styles(&mut self) {
        self.selected_styles.clear();
    }

    pub fn can_submit(&self) -> bool {
        !self.clothing_item.trim().is_empty()
    }

    /// 依輸入內容原樣建立請求
    pub fn to_request(&self) -> Result<RecommendationRequest> {
        if !self.can_submit() {
            return Err(StyloError::ValidationError {
                message: "Clothing item is required".to_string(),
            });
        }

        Ok(RecommendationRequest {
            clothing_item: self.clothing_item.clone(),
            color: self.color.clone(),
            style: self.selected_styles.clone(),
            gender: self.gender,
        })
    }
}
