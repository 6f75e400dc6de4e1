pub mod catalog;
pub mod form;
pub mod prompt;
pub mod sequencer;
pub mod session;

pub use crate::domain::model::{Gender, Prompt, RecommendationRequest, Recommendations, Theme};
pub use crate::domain::ports::{ImageGenerator, PreferenceStore, RecommendationSource};
pub use crate::utils::error::Result;
