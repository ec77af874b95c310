//! Match task endpoints.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::domain::errors::DomainResult;
use crate::services::task_service::{CreateTaskResponse, TaskDetail, TaskSummary};

use super::dto::{CreateMatchTaskRequest, ListTasksQuery, PageResponse};
use super::AppState;

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// `POST /api/match/tasks`
pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateMatchTaskRequest>,
) -> DomainResult<Json<CreateTaskResponse>> {
    let operator = header_value(&headers, "x-operator").unwrap_or("");
    let accept_language = header_value(&headers, "accept-language");

    let response = state
        .task_service
        .create_task(
            operator,
            request.member_id,
            &request.clothing_ids,
            request.scene,
            accept_language,
        )
        .await?;
    Ok(Json(response))
}

/// `GET /api/match/tasks/{task_id}`
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> DomainResult<Json<TaskDetail>> {
    Ok(Json(state.task_service.get_task(&task_id).await?))
}

/// `POST /api/match/tasks/{task_id}/outfits/{outfit_no}/preview`
pub async fn generate_outfit_preview(
    State(state): State<AppState>,
    Path((task_id, outfit_no)): Path<(String, u32)>,
    headers: HeaderMap,
) -> DomainResult<Json<TaskDetail>> {
    let accept_language = header_value(&headers, "accept-language");
    let detail = state
        .task_service
        .generate_outfit_preview(&task_id, outfit_no, accept_language)
        .await?;
    Ok(Json(detail))
}

/// `GET /api/match/tasks`
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> DomainResult<Json<PageResponse<TaskSummary>>> {
    let size = query.size.clamp(1, 100);
    let (items, total) = state.task_service.list_tasks(query.member_id, query.page, size).await?;
    Ok(Json(PageResponse { items, total, page: query.page, size }))
}
