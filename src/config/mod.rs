#[cfg(feature = "cli")]
pub mod cli;
pub mod preferences;
pub mod toml_config;

use crate::adapters::http::resolve_base_url;
use crate::core::sequencer::RetryPolicy;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

/// 合併命令列參數與設定檔後的實際設定
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub request_timeout: Option<Duration>,
    pub images_enabled: bool,
    pub retry_policy: RetryPolicy,
    pub preferences_path: PathBuf,
}

/// 優先於設定檔的命令列參數
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub host: Option<String>,
    pub prefs_file: Option<String>,
}

impl Settings {
    pub fn resolve(overrides: &Overrides, file: Option<&TomlConfig>) -> Result<Self> {
        let file = file.cloned().unwrap_or_default();
        file.validate()?;

        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| file.base_url().map(str::to_string))
            .unwrap_or_else(|| {
                let host = overrides.host.as_deref().or(file.host());
                resolve_base_url(host).to_string()
            });

        let preferences_path = overrides
            .prefs_file
            .as_deref()
            .or(file.preferences_path())
            .map(PathBuf::from)
            .unwrap_or_else(preferences::default_preferences_path);

        Ok(Self {
            base_url,
            request_timeout: file.request_timeout_secs().map(Duration::from_secs),
            images_enabled: file.images_enabled(),
            retry_policy: RetryPolicy {
                max_retries: file.max_retries(),
                retry_delay: Duration::from_millis(file.retry_delay_ms()),
            },
            preferences_path,
        })
    }
}

#[cfg(feature = "cli")]
impl From<&CliConfig> for Overrides {
    fn from(config: &CliConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            host: config.host.clone(),
            prefs_file: config.prefs_file.clone(),
        }
    }
}
