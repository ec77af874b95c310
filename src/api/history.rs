//! Worn-history endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::domain::errors::DomainResult;
use crate::services::task_service::{HistoryItem, HistoryList};

use super::dto::{CreateManualHistoryRequest, HistoryQuery, UpdateHistoryStatusRequest};
use super::AppState;

/// `GET /api/members/{member_id}/history`
pub async fn get_history(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> DomainResult<Json<HistoryList>> {
    let limit = query.limit.clamp(1, 100);
    Ok(Json(state.task_service.get_history(member_id, limit).await?))
}

/// `POST /api/members/{member_id}/history`
pub async fn create_manual_history(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
    Json(request): Json<CreateManualHistoryRequest>,
) -> DomainResult<Json<HistoryItem>> {
    let item = state
        .task_service
        .create_manual_history(
            member_id,
            request.clothing_id,
            request.performance_score,
            request.broadcast_date,
        )
        .await?;
    Ok(Json(item))
}

/// `PUT /api/members/{member_id}/history/{record_id}/status`
pub async fn update_history_status(
    State(state): State<AppState>,
    Path((member_id, record_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateHistoryStatusRequest>,
) -> DomainResult<Json<HistoryItem>> {
    let item = state
        .task_service
        .update_history_status(member_id, record_id, request.status)
        .await?;
    Ok(Json(item))
}
