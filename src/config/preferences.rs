//! 本機保存的使用者偏好設定
//!
//! 以固定 key 將字串值存入 JSON 檔。讀取時寬鬆處理：缺少或無法解析的值一律回到預設值。

use crate::domain::model::{Gender, Theme};
use crate::domain::ports::PreferenceStore;
use crate::utils::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const THEME_KEY: &str = "theme";
pub const GENDER_KEY: &str = "pref_gender";
pub const STYLES_KEY: &str = "pref_styles";

const MAX_PERSISTED_STYLES: usize = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    pub theme: Theme,
    pub gender: Gender,
    pub styles: Vec<String>,
}

impl Preferences {
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let theme = read(store, THEME_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let gender = read(store, GENDER_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let styles = read(store, STYLES_KEY)
            .and_then(|v| serde_json::from_str::<Vec<serde_json::Value>>(&v).ok())
            .map(|values| {
                values
                    .into_iter()
                    .take(MAX_PERSISTED_STYLES)
                    .filter_map(|value| match value {
                        serde_json::Value::String(style) => Some(style),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            theme,
            gender,
            styles,
        }
    }

    pub fn save_theme(store: &dyn PreferenceStore, theme: Theme) -> Result<()> {
        store.set_item(THEME_KEY, theme.as_str())
    }

    pub fn save_gender(store: &dyn PreferenceStore, gender: Gender) -> Result<()> {
        store.set_item(GENDER_KEY, gender.as_str())
    }

    pub fn save_styles(store: &dyn PreferenceStore, styles: &[String]) -> Result<()> {
        let encoded = serde_json::to_string(styles)?;
        store.set_item(STYLES_KEY, &encoded)
    }
}

fn read(store: &dyn PreferenceStore, key: &str) -> Option<String> {
    match store.get_item(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Ignoring unreadable preference '{}': {}", key, e);
            None
        }
    }
}

/// 預設偏好檔路徑：`<config dir>/stylo/preferences.json`
pub fn default_preferences_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stylo")
        .join("preferences.json")
}

/// 以扁平 JSON 物件存放在磁碟上的偏好設定
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read(&self.path)?;
        match serde_json::from_slice(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::debug!(
                    "Preference file {} is malformed, starting fresh: {}",
                    self.path.display(),
                    e
                );
                Ok(BTreeMap::new())
            }
        }
    }
}

impl PreferenceStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

/// 記憶體內的儲存，用於測試與臨時工作階段
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
