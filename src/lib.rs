//! Stylecast - AI outfit pairing recommendation service
//!
//! Stylecast recommends TOP+BOTTOM clothing pairings for profiled members
//! via an external AI provider. Recommendation work runs as durable
//! asynchronous tasks on a bounded worker pool, observable over SSE, with
//! on-demand styled-preview generation per outfit.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): models, ports, and errors
//! - **Service Layer** (`services`): admission, events, strategies, previews
//! - **Application Layer** (`application`): task executor and worker pool
//! - **Infrastructure Layer** (`infrastructure`): SQLite, AI providers, config
//! - **API Layer** (`api`): axum HTTP surface and SSE streaming

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{MatchTaskExecutor, MatchWorkerPool};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Clothing, ClothingStatus, ClothingType, Config, MatchRecord, MatchRecordStatus, MatchTask,
    Member, Outfit, OutfitPreview, OutputLanguage, TaskStatus,
};
pub use domain::ports::{
    AiClient, ClothingRepository, MatchRecordRepository, MemberRepository, TaskRepository,
};
pub use infrastructure::{ConfigError, ConfigLoader};
pub use services::{
    AdmissionGatekeeper, MatchTaskService, OutfitPreviewService, RateLimiter,
    RecommendationService, TaskEventBroadcaster,
};
