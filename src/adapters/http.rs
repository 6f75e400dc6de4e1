use crate::domain::model::{
    HealthStatus, ImageRequest, ImageResponse, Prompt, RecommendationRequest, Recommendations,
};
use crate::domain::ports::{ImageGenerator, RecommendationSource};
use crate::utils::error::{Result, StyloError};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

pub const LOCAL_API_URL: &str = "http://localhost:8000";
pub const PROD_API_URL: &str = "https://stylo-backend.onrender.com";

pub const RECOMMENDATIONS_PATH: &str = "/ai/recommendations";
pub const RECOMMENDATIONS_STREAM_PATH: &str = "/ai/recommendations/stream";
pub const GENERATE_IMAGE_PATH: &str = "/ai/generate-image";
pub const HEALTH_PATH: &str = "/health";

/// 依 host 選擇後端：localhost 用本機開發環境，其餘用正式環境
pub fn resolve_base_url(host: Option<&str>) -> &'static str {
    match host {
        Some("localhost") => LOCAL_API_URL,
        _ => PROD_API_URL,
    }
}

/// 推薦後端的 HTTP client
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// 設定請求逾時的 client；未設定時只有連線失敗才會中斷
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Recommendations> {
        let url = self.url(RECOMMENDATIONS_PATH);
        tracing::debug!("Making API request to: {}", url);

        let response = self.client.post(&url).json(request).send().await?;
        let response = ensure_success(RECOMMENDATIONS_PATH, response).await?;

        let recommendations: Recommendations = response.json().await?;
        tracing::debug!(
            "Received {} palette colors, {} inspirations, {} outfits",
            recommendations.color_palette.len(),
            recommendations.style_inspirations.len(),
            recommendations.outfits.len()
        );
        Ok(recommendations)
    }

    /// 從 SSE 端點串流模型原始輸出。每個事件內容到達時呼叫 `on_chunk`，最後回傳串接後的文字
    pub async fn stream_recommendations<F>(
        &self,
        request: &RecommendationRequest,
        mut on_chunk: F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        let url = self.url(RECOMMENDATIONS_STREAM_PATH);
        tracing::debug!("Opening recommendation stream: {}", url);

        let response = self.client.post(&url).json(request).send().await?;
        let mut response = ensure_success(RECOMMENDATIONS_STREAM_PATH, response).await?;

        let mut decoder = EventDecoder::default();
        let mut text = String::new();
        while let Some(bytes) = response.chunk().await? {
            for data in decoder.feed(&bytes) {
                on_chunk(&data);
                text.push_str(&data);
            }
        }
        for data in decoder.finish() {
            on_chunk(&data);
            text.push_str(&data);
        }

        Ok(text)
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        let url = self.url(GENERATE_IMAGE_PATH);
        tracing::debug!("Making image request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ImageRequest { prompt })
            .send()
            .await?;
        let response = ensure_success(GENERATE_IMAGE_PATH, response).await?;

        let body: ImageResponse = response.json().await?;
        Ok(body.image_url)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.url(HEALTH_PATH);
        let response = self.client.get(&url).send().await?;
        let response = ensure_success(HEALTH_PATH, response).await?;
        Ok(response.json().await?)
    }
}

async fn ensure_success(endpoint: &str, response: Response) -> Result<Response> {
    let status = response.status();
    tracing::debug!("API response status: {}", status);

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!("Request to {} failed ({}): {}", endpoint, status, body);
    Err(StyloError::RequestFailed {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RecommendationSource for ApiClient {
    async fn fetch_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Recommendations> {
        self.recommendations(request).await
    }
}

#[async_trait]
impl ImageGenerator for ApiClient {
    async fn generate_image(&self, prompt: &Prompt) -> Result<String> {
        ApiClient::generate_image(self, prompt.as_str()).await
    }
}

/// 逐步解析 `text/event-stream`，每個事件輸出一筆內容。
/// 收到完整一行才解碼，避免多位元組字元被切斷。
///
/// 後端以 `data: <delta>\n\n` 送出每段輸出且不跳脫 delta 內的換行，
/// 因此沒有欄位前綴的非空行視為目前事件資料的延續。
#[derive(Debug, Default)]
struct EventDecoder {
    buffer: Vec<u8>,
    data: Option<String>,
}

impl EventDecoder {
    fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(event) = self.process_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    fn finish(&mut self) -> Vec<String> {
        let rest = std::mem::take(&mut self.buffer);
        let mut events: Vec<String> = self
            .process_line(&String::from_utf8_lossy(&rest))
            .into_iter()
            .collect();
        events.extend(self.data.take());
        events
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return self.data.take();
        }
        if line.starts_with(':') {
            return None;
        }

        let value = match line.strip_prefix("data:") {
            Some(data) => data.strip_prefix(' ').unwrap_or(data),
            None => line,
        };
        match self.data.as_mut() {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => self.data = Some(value.to_string()),
        }
        None
    }
}
