//! Service layer: admission, events, strategies, preview, and the task
//! facade.

pub mod admission;
pub mod events;
pub mod preview;
pub mod strategy;
pub mod task_service;

pub use admission::{AdmissionGatekeeper, RateLimiter};
pub use events::{
    BroadcasterConfig, TaskEvent, TaskEventBroadcaster, EVENT_TASK_COMPLETED, EVENT_TASK_FAILED,
    EVENT_TASK_PROGRESS, EVENT_TASK_STARTED,
};
pub use preview::{OutfitPreviewService, PreviewDecision, PREVIEW_DEGRADED_WARNING};
pub use strategy::{
    AiRecommendationStrategy, RecommendationOutput, RecommendationRequest, RecommendationService,
    RecommendationStrategy, RuleRecommendationStrategy,
};
pub use task_service::{
    CreateTaskResponse, HistoryItem, HistoryList, MatchTaskService, TaskDetail, TaskSubmitter,
    TaskSummary, MAX_REQUEST_CLOTHING_IDS,
};
