use crate::adapters::http::{
    GENERATE_IMAGE_PATH, HEALTH_PATH, RECOMMENDATIONS_PATH, RECOMMENDATIONS_STREAM_PATH,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyloError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Request to {endpoint} failed with status {status}: {body}")]
    RequestFailed {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Image slot is {status}, expected {expected}")]
    SlotStateError { status: String, expected: String },

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

impl StyloError {
    /// 是否為呼叫後端時發生的錯誤
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            StyloError::ApiError(_) | StyloError::RequestFailed { .. }
        )
    }

    /// 顯示給使用者的訊息；請求失敗只顯示通用訊息，細節只寫入日誌
    pub fn user_friendly_message(&self) -> String {
        match self {
            StyloError::ApiError(e) => {
                request_failure_message(e.url().map(|url| url.path())).to_string()
            }
            StyloError::RequestFailed { endpoint, .. } => {
                request_failure_message(Some(endpoint)).to_string()
            }
            StyloError::SerializationError(_) => {
                "The backend returned a response that could not be read.".to_string()
            }
            StyloError::ValidationError { message } => message.clone(),
            StyloError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            StyloError::ConfigValidationError { message, .. }
            | StyloError::ConfigError { message } => message.clone(),
            StyloError::IoError(e) => format!("File access failed: {}", e),
            StyloError::SlotStateError { .. } | StyloError::TaskError(_) => self.to_string(),
        }
    }

    /// CLI 的結束代碼
    pub fn exit_code(&self) -> i32 {
        match self {
            StyloError::ApiError(_)
            | StyloError::RequestFailed { .. }
            | StyloError::SerializationError(_) => 2,
            StyloError::ValidationError { .. } | StyloError::SlotStateError { .. } => 1,
            _ => 3,
        }
    }
}

fn request_failure_message(path: Option<&str>) -> &'static str {
    match path {
        Some(p) if p.ends_with(RECOMMENDATIONS_PATH) || p.ends_with(RECOMMENDATIONS_STREAM_PATH) => {
            "Failed to get recommendations from backend."
        }
        Some(p) if p.ends_with(GENERATE_IMAGE_PATH) => "Failed to generate image.",
        Some(p) if p.ends_with(HEALTH_PATH) => "Backend health check failed.",
        _ => "Could not reach the backend.",
    }
}

pub type Result<T> = std::result::Result<T, StyloError>;
