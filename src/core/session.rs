use crate::core::form::RecommendationForm;
use crate::core::prompt::{inspiration_prompt, outfit_title};
use crate::core::sequencer::{ImageSequencer, ImageSlot, RetryPolicy, SlotStatus};
use crate::domain::model::{
    ColorPaletteItem, Gender, Outfit, Recommendations, StyleInspiration,
};
use crate::domain::ports::{ImageGenerator, RecommendationSource};
use crate::utils::error::{Result, StyloError};
use std::sync::Arc;

/// 一套穿搭與其（可選的）靈感圖片
#[derive(Debug, Clone)]
pub struct OutfitCard {
    pub outfit: Outfit,
    pub title: String,
    pub inspiration: Option<StyleInspiration>,
    pub slot: Option<ImageSlot>,
}

/// 單次送出後要顯示的全部內容
#[derive(Debug, Clone)]
pub struct RecommendationBoard {
    pub clothing_item: String,
    pub color: String,
    pub gender: Gender,
    pub palette: Vec<ColorPaletteItem>,
    pub cards: Vec<OutfitCard>,
}

impl RecommendationBoard {
    pub fn heading_subject(&self) -> String {
        format!("{} in {}", self.clothing_item, self.color)
    }
}

pub struct StylistSession<R: ?Sized, G: ?Sized> {
    source: Arc<R>,
    sequencer: ImageSequencer<G>,
    policy: RetryPolicy,
}

impl<R, G> StylistSession<R, G>
where
    R: RecommendationSource + ?Sized,
    G: ImageGenerator + ?Sized + 'static,
{
    pub fn new(source: Arc<R>, generator: Arc<G>) -> Self {
        Self {
            source,
            sequencer: ImageSequencer::new(generator),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 送出表單；未填完整的表單不會發出請求
    pub async fn submit(&self, form: &RecommendationForm) -> Result<Recommendations> {
        let request = form.to_request()?;
        tracing::info!(
            "🔍 Requesting recommendations for '{}' ({}), styles: {:?}",
            request.clothing_item,
            request.gender,
            request.style
        );

        match self.source.fetch_recommendations(&request).await {
            Ok(recommendations) => {
                tracing::info!(
                    "✅ Got {} outfits and {} palette colors",
                    recommendations.outfits.len(),
                    recommendations.color_palette.len()
                );
                Ok(recommendations)
            }
            Err(e) => {
                tracing::error!("❌ Failed to fetch recommendations: {}", e);
                Err(e)
            }
        }
    }

    /// 第 `i` 套穿搭搭配第 `i` 個風格靈感，只有配對成功的卡片才有圖片 slot
    pub fn build_board(
        &self,
        form: &RecommendationForm,
        recommendations: Recommendations,
    ) -> RecommendationBoard {
        let Recommendations {
            color_palette,
            style_inspirations,
            outfits,
        } = recommendations;

        let cards = outfits
            .into_iter()
            .enumerate()
            .map(|(idx, outfit)| {
                let inspiration = style_inspirations.get(idx).cloned();
                let slot = inspiration.as_ref().map(|inspiration| {
                    let prompt = inspiration_prompt(
                        inspiration,
                        &outfit,
                        &form.clothing_item,
                        &form.color,
                        form.gender,
                    );
                    ImageSlot::with_policy(Some(prompt), self.policy)
                });

                OutfitCard {
                    title: outfit_title(&outfit),
                    outfit,
                    inspiration,
                    slot,
                }
            })
            .collect();

        RecommendationBoard {
            clothing_item: form.clothing_item.clone(),
            color: form.color.clone(),
            gender: form.gender,
            palette: color_palette,
            cards,
        }
    }

    pub async fn recommend(&self, form: &RecommendationForm) -> Result<RecommendationBoard> {
        let recommendations = self.submit(form).await?;
        Ok(self.build_board(form, recommendations))
    }

    /// 並行執行所有卡片的圖片流程並等待全部結束
    pub async fn acquire_images(&self, board: &mut RecommendationBoard) -> Result<()> {
        let handles: Vec<_> = board
            .cards
            .iter_mut()
            .enumerate()
            .filter_map(|(idx, card)| {
                card.slot
                    .take()
                    .map(|slot| (idx, self.sequencer.spawn(slot)))
            })
            .collect();

        tracing::info!("🖼️ Generating {} inspiration images", handles.len());

        for (idx, handle) in handles {
            let slot = handle.join().await?;
            tracing::debug!("Card {} image settled as {}", idx + 1, slot.status());
            board.cards[idx].slot = Some(slot);
        }

        Ok(())
    }

    /// 手動重新生成第 `index` 張卡片
    pub async fn regenerate(
        &self,
        board: &mut RecommendationBoard,
        index: usize,
    ) -> Result<SlotStatus> {
        let card_count = board.cards.len();
        let card = board
            .cards
            .get_mut(index)
            .ok_or_else(|| StyloError::ValidationError {
                message: format!("No card {} (have {})", index + 1, card_count),
            })?;

        let slot = card
            .slot
            .as_mut()
            .ok_or_else(|| StyloError::ValidationError {
                message: format!("Card {} has no inspiration image", index + 1),
            })?;

        self.sequencer.regenerate(slot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Prompt, RecommendationRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedSource {
        response: Recommendations,
        requests: Mutex<Vec<RecommendationRequest>>,
    }

    #[async_trait]
    impl RecommendationSource for FixedSource {
        async fn fetch_recommendations(
            &self,
            request: &RecommendationRequest,
        ) -> Result<Recommendations> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    /// prompt 含 "casual" 時成功，其餘失敗
    struct PickyGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageGenerator for PickyGenerator {
        async fn generate_image(&self, prompt: &Prompt) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.as_str().contains("casual") {
                Ok(format!("https://img/{}.png", n))
            } else {
                Err(StyloError::RequestFailed {
                    endpoint: "/ai/generate-image".to_string(),
                    status: 503,
                    body: String::new(),
                })
            }
        }
    }

    fn recommendations() -> Recommendations {
        Recommendations {
            color_palette: vec![ColorPaletteItem {
                name: "Navy".to_string(),
                hex: "#000080".to_string(),
            }],
            style_inspirations: vec![
                StyleInspiration {
                    description: "Casual".to_string(),
                    main_image_prompt: String::new(),
                },
                StyleInspiration {
                    description: "Formal".to_string(),
                    main_image_prompt: String::new(),
                },
            ],
            outfits: vec![
                Outfit {
                    top: Some("tee".to_string()),
                    pants: Some("jeans".to_string()),
                    shoes: Some("sneakers".to_string()),
                    image_prompt: None,
                },
                Outfit {
                    top: None,
                    pants: Some("trousers".to_string()),
                    shoes: Some("oxfords".to_string()),
                    image_prompt: None,
                },
                Outfit::default(),
            ],
        }
    }

    fn session() -> (
        Arc<FixedSource>,
        Arc<PickyGenerator>,
        StylistSession<FixedSource, PickyGenerator>,
    ) {
        let source = Arc::new(FixedSource {
            response: recommendations(),
            requests: Mutex::new(Vec::new()),
        });
        let generator = Arc::new(PickyGenerator {
            calls: AtomicUsize::new(0),
        });
        let session = StylistSession::new(source.clone(), generator.clone());
        (source, generator, session)
    }

    fn form() -> RecommendationForm {
        let mut form = RecommendationForm::new();
        form.clothing_item = "shirt".to_string();
        form.color = "red".to_string();
        form
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_item_without_request() {
        let (source, _, session) = session();

        let result = session.submit(&RecommendationForm::new()).await;

        assert!(matches!(result, Err(StyloError::ValidationError { .. })));
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_board_pairs_inspirations_by_index() {
        let (_, _, session) = session();
        let board = session.recommend(&form()).await.unwrap();

        assert_eq!(board.palette.len(), 1);
        assert_eq!(board.cards.len(), 3);
        assert!(board.cards[0].slot.is_some());
        assert!(board.cards[1].slot.is_some());
        assert!(board.cards[2].slot.is_none());
        assert_eq!(board.cards[1].title, "trousers, oxfords");
        assert_eq!(board.cards[2].title, "Full Image");
        assert_eq!(board.heading_subject(), "shirt in red");
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_images_settles_each_slot_independently() {
        let (_, generator, session) = session();
        let mut board = session.recommend(&form()).await.unwrap();

        session.acquire_images(&mut board).await.unwrap();

        let casual = board.cards[0].slot.as_ref().unwrap();
        assert_eq!(casual.status(), SlotStatus::Success);
        assert!(casual.image_url().is_some());

        let formal = board.cards[1].slot.as_ref().unwrap();
        assert_eq!(formal.status(), SlotStatus::Failed);
        assert_eq!(formal.retry_count(), 2);

        // casual 卡片一次，formal 卡片三次
        assert_eq!(generator.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_regenerate_requires_existing_slot() {
        let (_, _, session) = session();
        let mut board = session.recommend(&form()).await.unwrap();
        session.acquire_images(&mut board).await.unwrap();

        assert!(session.regenerate(&mut board, 2).await.is_err());
        assert!(session.regenerate(&mut board, 9).await.is_err());
        assert!(matches!(
            session.regenerate(&mut board, 1).await,
            Err(StyloError::SlotStateError { .. })
        ));
        assert_eq!(
            session.regenerate(&mut board, 0).await.unwrap(),
            SlotStatus::Success
        );
    }
}
