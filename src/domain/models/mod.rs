//! Domain models.

pub mod clothing;
pub mod config;
pub mod language;
pub mod member;
pub mod outfit;
pub mod record;
pub mod task;

pub use clothing::{Clothing, ClothingStatus, ClothingType};
pub use config::{
    AiConfig, Config, DatabaseConfig, GeminiConfig, MatchPoolConfig, OpenAiConfig,
    RateLimitConfig, ServerConfig,
};
pub use language::OutputLanguage;
pub use member::{parse_style_tags, BodyMeasurements, Member};
pub use outfit::{flatten_outfits, FlatResultItem, Outfit, OutfitPreview, DEFAULT_OUTFIT_REASON};
pub use record::{dedup_window_start, MatchRecord, MatchRecordStatus, DEDUP_WINDOW_DAYS};
pub use task::{truncate_message, MatchTask, TaskStatus, MAX_ERROR_MESSAGE_LENGTH};
