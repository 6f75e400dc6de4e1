use crate::core::sequencer::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::utils::error::{Result, StyloError};
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 選用的 `stylo.toml` 設定，每個區段都可省略
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api: Option<ApiConfig>,
    pub images: Option<ImagesConfig>,
    pub preferences: Option<PreferencesConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub host: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagesConfig {
    pub enabled: Option<bool>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesConfig {
    pub path: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| StyloError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 `${VAR_NAME}`，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| StyloError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn base_url(&self) -> Option<&str> {
        self.api.as_ref().and_then(|a| a.base_url.as_deref())
    }

    pub fn host(&self) -> Option<&str> {
        self.api.as_ref().and_then(|a| a.host.as_deref())
    }

    pub fn request_timeout_secs(&self) -> Option<u64> {
        self.api.as_ref().and_then(|a| a.request_timeout_secs)
    }

    pub fn images_enabled(&self) -> bool {
        self.images.as_ref().and_then(|i| i.enabled).unwrap_or(true)
    }

    pub fn max_retries(&self) -> u32 {
        self.images
            .as_ref()
            .and_then(|i| i.max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES)
    }

    pub fn retry_delay_ms(&self) -> u64 {
        self.images
            .as_ref()
            .and_then(|i| i.retry_delay_ms)
            .unwrap_or(DEFAULT_RETRY_DELAY.as_millis() as u64)
    }

    pub fn preferences_path(&self) -> Option<&str> {
        self.preferences.as_ref().and_then(|p| p.path.as_deref())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = self.base_url() {
            validate_url("api.base_url", base_url)?;
        }
        if let Some(timeout) = self.request_timeout_secs() {
            validate_range("api.request_timeout_secs", timeout, 1, 600)?;
        }
        validate_range("images.max_retries", self.max_retries(), 0, 10)?;
        validate_range("images.retry_delay_ms", self.retry_delay_ms(), 0, 60_000)?;
        if let Some(path) = self.preferences_path() {
            validate_path("preferences.path", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert!(config.base_url().is_none());
        assert!(config.images_enabled());
        assert_eq!(config.max_retries(), 2);
        assert_eq!(config.retry_delay_ms(), 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "http://localhost:9000"
request_timeout_secs = 30

[images]
enabled = false
max_retries = 4
retry_delay_ms = 500

[preferences]
path = "/tmp/stylo/prefs.json"
"#,
        )
        .unwrap();

        assert_eq!(config.base_url(), Some("http://localhost:9000"));
        assert_eq!(config.request_timeout_secs(), Some(30));
        assert!(!config.images_enabled());
        assert_eq!(config.max_retries(), 4);
        assert_eq!(config.retry_delay_ms(), 500);
        assert_eq!(config.preferences_path(), Some("/tmp/stylo/prefs.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("STYLO_TEST_BACKEND", "http://127.0.0.1:8123");
        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "${STYLO_TEST_BACKEND}"
"#,
        )
        .unwrap();

        assert_eq!(config.base_url(), Some("http://127.0.0.1:8123"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "ftp://nope"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[images]\nmax_retries = 50\n").unwrap();
        assert!(config.validate().is_err());

        assert!(TomlConfig::from_toml_str("[api\n").is_err());
    }
}
