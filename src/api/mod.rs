//! HTTP surface: router, shared state, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod history;
pub mod sse;
pub mod tasks;

use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

use crate::services::events::TaskEventBroadcaster;
use crate::services::task_service::MatchTaskService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub task_service: Arc<MatchTaskService>,
    pub events: Arc<TaskEventBroadcaster>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/match/tasks", post(tasks::create_task).get(tasks::list_tasks))
        .route("/api/match/tasks/:task_id", get(tasks::get_task))
        .route(
            "/api/match/tasks/:task_id/outfits/:outfit_no/preview",
            post(tasks::generate_outfit_preview),
        )
        .route("/api/match/tasks/:task_id/events", get(sse::stream_task_events))
        .route(
            "/api/members/:member_id/history",
            get(history::get_history).post(history::create_manual_history),
        )
        .route(
            "/api/members/:member_id/history/:record_id/status",
            put(history::update_history_status),
        )
        .with_state(state)
}
