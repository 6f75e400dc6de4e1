use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 連身造型時後端用來取代上衣的標記
pub const COMPLETE_DRESS_LOOK: &str = "N/A (complete dress look)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Men,
    Women,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Men => "men",
            Gender::Women => "women",
        }
    }

    pub fn model_label(&self) -> &'static str {
        match self {
            Gender::Men => "Male model",
            Gender::Women => "Female model",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "men" => Ok(Gender::Men),
            "women" => Ok(Gender::Women),
            other => Err(format!("unknown gender '{}', expected men or women", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme '{}', expected dark or light", other)),
        }
    }
}

/// 送往圖片生成服務的文字描述
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub clothing_item: String,
    pub color: String,
    pub style: Vec<String>,
    pub gender: Gender,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorPaletteItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hex: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleInspiration {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub main_image_prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outfit {
    #[serde(default)]
    pub top: Option<String>,
    #[serde(default)]
    pub pants: Option<String>,
    #[serde(default)]
    pub shoes: Option<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
}

impl Outfit {
    /// 上衣名稱；缺少、空白或為連身標記時回傳 None
    pub fn displayable_top(&self) -> Option<&str> {
        self.top
            .as_deref()
            .filter(|top| !top.is_empty() && *top != COMPLETE_DRESS_LOOK)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub color_palette: Vec<ColorPaletteItem>,
    #[serde(default)]
    pub style_inspirations: Vec<StyleInspiration>,
    #[serde(default)]
    pub outfits: Vec<Outfit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageResponse {
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
