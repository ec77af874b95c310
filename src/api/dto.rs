//! Request/response bodies for the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::MatchRecordStatus;

/// Body of `POST /api/match/tasks`.
#[derive(Debug, Deserialize)]
pub struct CreateMatchTaskRequest {
    pub member_id: i64,
    pub clothing_ids: Vec<i64>,
    #[serde(default)]
    pub scene: Option<String>,
}

/// Query parameters for the task listing.
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub member_id: Option<i64>,
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
}

fn default_page_size() -> u32 {
    10
}

/// Generic paginated listing envelope.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
}

/// Query parameters for the history listing.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

fn default_history_limit() -> u32 {
    20
}

/// Body of `POST /api/members/{member_id}/history`.
#[derive(Debug, Deserialize)]
pub struct CreateManualHistoryRequest {
    pub clothing_id: i64,
    #[serde(default)]
    pub performance_score: Option<i32>,
    #[serde(default)]
    pub broadcast_date: Option<DateTime<Utc>>,
}

/// Body of `PUT /api/members/{member_id}/history/{record_id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateHistoryStatusRequest {
    pub status: MatchRecordStatus,
}
