pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod ui;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::ApiClient;
pub use config::preferences::{FileStore, MemoryStore, Preferences};
pub use config::{Settings, TomlConfig};
pub use core::form::RecommendationForm;
pub use core::sequencer::{ImageSequencer, ImageSlot, RetryPolicy, SlotStatus};
pub use core::session::{RecommendationBoard, StylistSession};
pub use utils::error::{Result, StyloError};
