//! Domain ports: trait seams between the core and its adapters.

pub mod ai_client;
pub mod clothing_repository;
pub mod member_repository;
pub mod record_repository;
pub mod task_repository;

pub use ai_client::{AiClient, AiError, AiErrorKind, AiOperation, OutfitSuggestion};
pub use clothing_repository::ClothingRepository;
pub use member_repository::MemberRepository;
pub use record_repository::MatchRecordRepository;
pub use task_repository::TaskRepository;
