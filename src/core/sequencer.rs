//! 單張卡片的圖片取得流程
//!
//! [`ImageSlot`] 保存每張卡片的狀態並提供純粹的狀態轉換，
//! [`ImageSequencer`] 透過 [`ImageGenerator`] 執行這些轉換，以固定間隔重試有限次數。
//!
//! ```text
//! pending -> loading -> success
//!               |
//!               +-> retry-wait --(delay)--> pending     (retry_count < max)
//!               +-> failed                              (retry_count >= max)
//! ```

use crate::core::prompt::{variation_prompt, variation_seed};
use crate::domain::model::Prompt;
use crate::domain::ports::ImageGenerator;
use crate::utils::error::{Result, StyloError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Pending,
    Loading,
    Success,
    Failed,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Pending => "pending",
            SlotStatus::Loading => "loading",
            SlotStatus::Success => "success",
            SlotStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 單次請求結果套用到 slot 後的轉換
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Succeeded,
    RetryAfter(Duration),
    Failed,
    /// slot 並未在等待請求，狀態不變
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ImageSlot {
    prompt: Option<Prompt>,
    regenerate_prompt: Option<Prompt>,
    status: SlotStatus,
    image_url: Option<String>,
    retry_count: u32,
    awaiting_retry: bool,
    manual: bool,
    policy: RetryPolicy,
}

impl ImageSlot {
    pub fn new(prompt: Option<Prompt>) -> Self {
        Self::with_policy(prompt, RetryPolicy::default())
    }

    /// 沒有可用 prompt 的 slot 直接是 failed
    pub fn with_policy(prompt: Option<Prompt>, policy: RetryPolicy) -> Self {
        let prompt = prompt.filter(|p| !p.is_empty());
        let status = if prompt.is_some() {
            SlotStatus::Pending
        } else {
            SlotStatus::Failed
        };

        Self {
            regenerate_prompt: prompt.clone(),
            prompt,
            status,
            image_url: None,
            retry_count: 0,
            awaiting_retry: false,
            manual: false,
            policy,
        }
    }

    /// 手動重新生成時使用的基礎 prompt（與自動流程不同時）
    pub fn with_regenerate_prompt(mut self, prompt: Prompt) -> Self {
        self.regenerate_prompt = Some(prompt);
        self
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn is_awaiting_retry(&self) -> bool {
        self.awaiting_retry
    }

    /// `pending -> loading`，回傳要請求的 prompt；其他狀態回傳 `None`
    pub fn begin_attempt(&mut self) -> Option<Prompt> {
        if self.status != SlotStatus::Pending {
            return None;
        }
        let prompt = self.prompt.clone()?;
        self.status = SlotStatus::Loading;
        self.manual = false;
        Some(prompt)
    }

    pub fn record_success(&mut self, image_url: String) -> Transition {
        if !self.in_flight() {
            return Transition::Ignored;
        }
        self.image_url = Some(image_url);
        self.status = SlotStatus::Success;
        self.manual = false;
        Transition::Succeeded
    }

    pub fn record_failure(&mut self) -> Transition {
        if !self.in_flight() {
            return Transition::Ignored;
        }

        if self.manual {
            self.manual = false;
            self.status = SlotStatus::Failed;
            return Transition::Failed;
        }

        if self.retry_count < self.policy.max_retries {
            self.retry_count += 1;
            self.awaiting_retry = true;
            Transition::RetryAfter(self.policy.retry_delay)
        } else {
            self.status = SlotStatus::Failed;
            Transition::Failed
        }
    }

    /// 重試延遲結束後 `retry-wait -> pending`
    pub fn resume_after_delay(&mut self) -> bool {
        if !self.awaiting_retry {
            return false;
        }
        self.awaiting_retry = false;
        self.status = SlotStatus::Pending;
        true
    }

    /// 開始手動重新生成，只允許從 `success` 開始，不影響重試次數
    pub fn begin_regenerate(&mut self, variation: u32) -> Result<Prompt> {
        if self.status != SlotStatus::Success {
            return Err(StyloError::SlotStateError {
                status: self.status.to_string(),
                expected: SlotStatus::Success.to_string(),
            });
        }
        let base = self
            .regenerate_prompt
            .as_ref()
            .or(self.prompt.as_ref())
            .ok_or_else(|| StyloError::SlotStateError {
                status: "without prompt".to_string(),
                expected: "a prompt".to_string(),
            })?;

        let prompt = variation_prompt(base, variation);
        self.status = SlotStatus::Loading;
        self.manual = true;
        Ok(prompt)
    }

    fn in_flight(&self) -> bool {
        self.status == SlotStatus::Loading && !self.awaiting_retry
    }
}

/// 以圖片生成器驅動 [`ImageSlot`]
pub struct ImageSequencer<G: ?Sized> {
    generator: Arc<G>,
}

impl<G: ?Sized> Clone for ImageSequencer<G> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<G: ImageGenerator + ?Sized + 'static> ImageSequencer<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }

    /// 執行自動流程直到 `success` 或 `failed`，非 pending 的 slot 不做任何事
    pub async fn run(&self, slot: &mut ImageSlot) -> SlotStatus {
        self.run_observed(slot, None).await
    }

    async fn run_observed(
        &self,
        slot: &mut ImageSlot,
        observer: Option<&watch::Sender<SlotStatus>>,
    ) -> SlotStatus {
        loop {
            let Some(prompt) = slot.begin_attempt() else {
                return slot.status();
            };
            publish(observer, slot.status());

            let attempt = slot.retry_count() + 1;
            tracing::debug!("🖼️ Requesting image (attempt {}): {}", attempt, prompt);

            let transition = match self.generator.generate_image(&prompt).await {
                Ok(url) => slot.record_success(url),
                Err(e) => {
                    tracing::warn!(
                        "Failed to generate image for prompt \"{}\" (attempt {}): {}",
                        prompt,
                        attempt,
                        e
                    );
                    slot.record_failure()
                }
            };

            match transition {
                Transition::RetryAfter(delay) => {
                    tracing::debug!("⏳ Retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    slot.resume_after_delay();
                }
                _ => {
                    publish(observer, slot.status());
                    return slot.status();
                }
            }
        }
    }

    /// 從 `success` 手動重新生成，失敗不重試，直接進入 `failed`
    pub async fn regenerate(&self, slot: &mut ImageSlot) -> Result<SlotStatus> {
        let prompt = slot.begin_regenerate(variation_seed())?;
        tracing::debug!("🔁 Regenerating image: {}", prompt);

        match self.generator.generate_image(&prompt).await {
            Ok(url) => {
                slot.record_success(url);
                tracing::info!("✅ Image updated: generated a new variation");
            }
            Err(e) => {
                tracing::warn!("Failed to regenerate image for prompt \"{}\": {}", prompt, e);
                slot.record_failure();
            }
        }

        Ok(slot.status())
    }

    /// 在獨立 task 中執行 slot。handle 被 drop 時會中止 task，包含尚未到期的重試
    pub fn spawn(&self, slot: ImageSlot) -> SlotHandle {
        let (tx, rx) = watch::channel(slot.status());
        let sequencer = self.clone();

        let task = tokio::spawn(async move {
            let mut slot = slot;
            sequencer.run_observed(&mut slot, Some(&tx)).await;
            slot
        });

        SlotHandle {
            task: Some(task),
            status: rx,
        }
    }
}

fn publish(observer: Option<&watch::Sender<SlotStatus>>, status: SlotStatus) {
    if let Some(tx) = observer {
        // 沒有 receiver 代表沒人在觀察
        let _ = tx.send(status);
    }
}

/// 背景 slot task 的擁有者
pub struct SlotHandle {
    task: Option<JoinHandle<ImageSlot>>,
    status: watch::Receiver<SlotStatus>,
}

impl SlotHandle {
    pub fn status(&self) -> SlotStatus {
        *self.status.borrow()
    }

    pub async fn join(mut self) -> Result<ImageSlot> {
        match self.task.take() {
            Some(task) => Ok(task.await?),
            None => Err(StyloError::SlotStateError {
                status: "detached".to_string(),
                expected: "a running task".to_string(),
            }),
        }
    }
}

impl Drop for SlotHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 依序回放預設結果，用完後一律失敗
    struct ScriptedGenerator {
        script: Mutex<VecDeque<std::result::Result<String, u16>>>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<std::result::Result<&str, u16>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(
                    script
                        .into_iter()
                        .map(|r| r.map(str::to_string))
                        .collect(),
                ),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageGenerator for ScriptedGenerator {
        async fn generate_image(&self, prompt: &Prompt) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Err(500));
            next.map_err(|status| StyloError::RequestFailed {
                endpoint: "/ai/generate-image".to_string(),
                status,
                body: "boom".to_string(),
            })
        }
    }

    fn slot() -> ImageSlot {
        ImageSlot::new(Some(Prompt::new("red shirt outfit")))
    }

    #[test]
    fn test_slot_without_prompt_starts_failed() {
        assert_eq!(ImageSlot::new(None).status(), SlotStatus::Failed);
        assert_eq!(
            ImageSlot::new(Some(Prompt::new("  "))).status(),
            SlotStatus::Failed
        );
        assert_eq!(slot().status(), SlotStatus::Pending);
    }

    #[test]
    fn test_begin_attempt_only_from_pending() {
        let mut slot = slot();
        assert!(slot.begin_attempt().is_some());
        assert_eq!(slot.status(), SlotStatus::Loading);
        assert!(slot.begin_attempt().is_none());
    }

    #[test]
    fn test_failure_transitions_respect_retry_budget() {
        let mut slot = slot();

        slot.begin_attempt();
        assert_eq!(slot.record_failure(), Transition::RetryAfter(DEFAULT_RETRY_DELAY));
        assert_eq!(slot.retry_count(), 1);
        // 等待期間的過期結果不影響狀態
        assert_eq!(slot.record_success("late".to_string()), Transition::Ignored);
        assert!(slot.resume_after_delay());
        assert_eq!(slot.status(), SlotStatus::Pending);

        slot.begin_attempt();
        assert_eq!(slot.record_failure(), Transition::RetryAfter(DEFAULT_RETRY_DELAY));
        slot.resume_after_delay();

        slot.begin_attempt();
        assert_eq!(slot.record_failure(), Transition::Failed);
        assert_eq!(slot.status(), SlotStatus::Failed);
        assert_eq!(slot.retry_count(), 2);
        assert!(slot.begin_attempt().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let generator = ScriptedGenerator::new(vec![Ok("https://img/1.png")]);
        let sequencer = ImageSequencer::new(generator.clone());
        let mut slot = slot();

        let status = sequencer.run(&mut slot).await;

        assert_eq!(status, SlotStatus::Success);
        assert_eq!(slot.image_url(), Some("https://img/1.png"));
        assert_eq!(slot.retry_count(), 0);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_end_in_failed() {
        let generator = ScriptedGenerator::new(vec![Err(500), Err(502), Err(503)]);
        let sequencer = ImageSequencer::new(generator.clone());
        let mut slot = slot();
        let started = tokio::time::Instant::now();

        let status = sequencer.run(&mut slot).await;

        assert_eq!(status, SlotStatus::Failed);
        assert_eq!(generator.calls(), 3);
        assert_eq!(slot.retry_count(), 2);
        assert!(slot.image_url().is_none());
        assert!(started.elapsed() >= DEFAULT_RETRY_DELAY * 2);

        // 終止狀態：再次執行不會送出請求
        sequencer.run(&mut slot).await;
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_each_attempt_is_final() {
        for k in 1..=3usize {
            let mut script: Vec<std::result::Result<&str, u16>> = vec![Err(500); k - 1];
            script.push(Ok("https://img/ok.png"));
            let generator = ScriptedGenerator::new(script);
            let sequencer = ImageSequencer::new(generator.clone());
            let mut slot = slot();

            assert_eq!(sequencer.run(&mut slot).await, SlotStatus::Success);
            assert_eq!(slot.image_url(), Some("https://img/ok.png"));
            assert_eq!(generator.calls(), k);
            assert_eq!(slot.retry_count() as usize, k - 1);

            assert_eq!(sequencer.run(&mut slot).await, SlotStatus::Success);
            assert_eq!(generator.calls(), k);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_regenerate_keeps_retry_count_and_fails_once() {
        let generator = ScriptedGenerator::new(vec![Err(500), Ok("https://img/1.png"), Err(500)]);
        let sequencer = ImageSequencer::new(generator.clone());
        let mut slot = slot();

        sequencer.run(&mut slot).await;
        assert_eq!(slot.retry_count(), 1);

        let status = sequencer.regenerate(&mut slot).await.unwrap();

        assert_eq!(status, SlotStatus::Failed);
        assert_eq!(slot.retry_count(), 1);
        assert_eq!(generator.calls(), 3);
        assert!(generator.prompts()[2].starts_with("red shirt outfit Variation "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_regenerate_success_replaces_url() {
        let generator = ScriptedGenerator::new(vec![Ok("https://img/1.png"), Ok("https://img/2.png")]);
        let sequencer = ImageSequencer::new(generator.clone());
        let mut slot = slot().with_regenerate_prompt(Prompt::new("alt prompt"));

        sequencer.run(&mut slot).await;
        sequencer.regenerate(&mut slot).await.unwrap();

        assert_eq!(slot.status(), SlotStatus::Success);
        assert_eq!(slot.image_url(), Some("https://img/2.png"));
        assert!(generator.prompts()[1].starts_with("alt prompt Variation "));
    }

    #[tokio::test]
    async fn test_regenerate_rejected_unless_success() {
        let generator = ScriptedGenerator::new(vec![]);
        let sequencer = ImageSequencer::new(generator.clone());
        let mut slot = slot();

        let result = sequencer.regenerate(&mut slot).await;

        assert!(matches!(result, Err(StyloError::SlotStateError { .. })));
        assert_eq!(slot.status(), SlotStatus::Pending);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_slot_reports_final_status() {
        let generator = ScriptedGenerator::new(vec![Err(500), Ok("https://img/1.png")]);
        let sequencer = ImageSequencer::new(generator.clone());

        let handle = sequencer.spawn(slot());
        let slot = handle.join().await.unwrap();

        assert_eq!(slot.status(), SlotStatus::Success);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_pending_retry() {
        let generator = ScriptedGenerator::new(vec![]);
        let sequencer = ImageSequencer::new(generator.clone());

        let handle = sequencer.spawn(slot());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(generator.calls(), 1);
        assert_eq!(handle.status(), SlotStatus::Loading);

        drop(handle);
        tokio::time::sleep(DEFAULT_RETRY_DELAY * 5).await;

        assert_eq!(generator.calls(), 1);
    }
}
