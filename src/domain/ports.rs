use crate::domain::model::{Prompt, RecommendationRequest, Recommendations};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 穿搭推薦來源
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn fetch_recommendations(&self, request: &RecommendationRequest)
        -> Result<Recommendations>;
}

/// 將 prompt 轉成可顯示的圖片 URL
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &Prompt) -> Result<String>;
}

/// 偏好設定的字串 key/value 儲存
pub trait PreferenceStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}
