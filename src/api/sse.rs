//! SSE endpoint streaming task progress events.

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use futures::StreamExt;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

use crate::domain::errors::DomainResult;

use super::AppState;

/// `GET /api/match/tasks/{task_id}/events`
///
/// Emits `task_started`, `task_progress`, `task_completed`, and
/// `task_failed`. The stream self-closes after a terminal event because the
/// broadcaster drops the channel. Subscribers have no timeout; keep-alive
/// comments hold idle connections open.
pub async fn stream_task_events(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> DomainResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    // Reject unknown task ids before opening the stream.
    state.task_service.get_task(&task_id).await?;

    let receiver = state.events.subscribe(&task_id).await;
    let stream = BroadcastStream::new(receiver).filter_map(|item| async move {
        match item {
            Ok(task_event) => Event::default()
                .event(&task_event.event)
                .id(&task_event.task_id)
                .json_data(&task_event.payload)
                .ok()
                .map(Ok),
            Err(lagged) => {
                // A slow subscriber missed events; skip and keep streaming.
                warn!(error = %lagged, "SSE subscriber lagged");
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new().interval(Duration::from_secs(30)).text("keep-alive"),
    ))
}
