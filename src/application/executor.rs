//! Task executor: drives one task from QUEUED to a terminal state.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    flatten_outfits, truncate_message, MatchRecord, TaskStatus,
};
use crate::domain::ports::{
    ClothingRepository, MatchRecordRepository, MemberRepository, TaskRepository,
};
use crate::services::events::{
    TaskEventBroadcaster, EVENT_TASK_COMPLETED, EVENT_TASK_FAILED, EVENT_TASK_PROGRESS,
    EVENT_TASK_STARTED,
};
use crate::services::strategy::{RecommendationRequest, RecommendationService};

/// History entries loaded as prompt context.
const HISTORY_CONTEXT_LIMIT: u32 = 10;

/// Executes one task per call on a worker, publishing progress along the
/// way. Occupies its worker for the whole duration, including blocking
/// provider calls and the deliberate pacing delays.
pub struct MatchTaskExecutor {
    task_repo: Arc<dyn TaskRepository>,
    member_repo: Arc<dyn MemberRepository>,
    clothing_repo: Arc<dyn ClothingRepository>,
    record_repo: Arc<dyn MatchRecordRepository>,
    recommendation: Arc<RecommendationService>,
    events: Arc<TaskEventBroadcaster>,
    progress_pacing: Duration,
}

impl MatchTaskExecutor {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        member_repo: Arc<dyn MemberRepository>,
        clothing_repo: Arc<dyn ClothingRepository>,
        record_repo: Arc<dyn MatchRecordRepository>,
        recommendation: Arc<RecommendationService>,
        events: Arc<TaskEventBroadcaster>,
        progress_pacing_ms: u64,
    ) -> Self {
        Self {
            task_repo,
            member_repo,
            clothing_repo,
            record_repo,
            recommendation,
            events,
            progress_pacing: Duration::from_millis(progress_pacing_ms),
        }
    }

    /// Run the task to a terminal state. Never panics the worker: every
    /// failure funnels into the FAILED handling path.
    pub async fn process(&self, task_id: &str) {
        if let Err(err) = self.run(task_id).await {
            self.handle_failure(task_id, &err).await;
        }
    }

    async fn run(&self, task_id: &str) -> DomainResult<()> {
        let mut task = self
            .task_repo
            .get(task_id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("Task not found: {task_id}")))?;

        task.transition_to(TaskStatus::Running).map_err(DomainError::Internal)?;
        self.task_repo.update(&task).await?;
        self.events
            .publish(task_id, EVENT_TASK_STARTED, json!({"task_id": task_id, "status": "RUNNING"}))
            .await;
        info!(task_id, member_id = task.member_id, "match task started");

        let member = self
            .member_repo
            .get_active(task.member_id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("Member not found: {}", task.member_id)))?;

        let candidates = self.clothing_repo.find_active_by_ids(&task.candidate_ids).await?;
        if candidates.is_empty() {
            return Err(DomainError::Internal(
                "No valid clothing candidates available".to_string(),
            ));
        }
        // A candidate that vanished since admission is a hard failure, not a
        // silent skip.
        let missing: Vec<i64> = task
            .candidate_ids
            .iter()
            .copied()
            .filter(|id| !candidates.iter().any(|c| c.id == *id))
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::Internal(format!(
                "Candidate clothing missing or inactive: {missing:?}"
            )));
        }

        // The underlying work is not finely divisible; pace two checkpoints
        // so subscribers see movement.
        tokio::time::sleep(self.progress_pacing).await;
        self.events
            .publish(task_id, EVENT_TASK_PROGRESS, json!({"task_id": task_id, "progress": 45}))
            .await;

        let history =
            self.record_repo.top_by_performance(task.member_id, HISTORY_CONTEXT_LIMIT).await?;

        let request = RecommendationRequest {
            member: &member,
            candidates: &candidates,
            history: &history,
            scene: task.scene.as_deref(),
            language: task.language,
        };
        let output = self.recommendation.recommend(&request).await?;

        tokio::time::sleep(self.progress_pacing).await;
        self.events
            .publish(task_id, EVENT_TASK_PROGRESS, json!({"task_id": task_id, "progress": 85}))
            .await;

        let flat = flatten_outfits(&output.outfits);
        let records: Vec<MatchRecord> = flat
            .iter()
            .map(|item| MatchRecord::draft(task.member_id, item.clothing_id, Some(item.score)))
            .collect();
        self.record_repo.insert_all(&records).await?;

        task.strategy_name = Some(output.strategy_name.clone());
        task.outfits = output.outfits.clone();
        task.set_error_message(output.warning.clone());
        task.transition_to(TaskStatus::Succeeded).map_err(DomainError::Internal)?;
        self.task_repo.update(&task).await?;

        self.events
            .publish(
                task_id,
                EVENT_TASK_COMPLETED,
                json!({
                    "task_id": task_id,
                    "status": "SUCCEEDED",
                    "strategy": output.strategy_name,
                    "outfits": output.outfits,
                    "result": flat,
                    "preview": null,
                    "warning": output.warning,
                }),
            )
            .await;
        info!(task_id, outfits = task.outfits.len(), "match task succeeded");
        Ok(())
    }

    async fn handle_failure(&self, task_id: &str, err: &DomainError) {
        let message = truncate_message(&err.to_string());
        error!(task_id, error = %message, "match task failed");

        if let Err(update_err) = self.persist_failed(task_id, &message).await {
            error!(task_id, error = %update_err, "failed to persist FAILED status, using minimal write");
            if let Err(fallback_err) = self
                .task_repo
                .update_status_and_error(task_id, TaskStatus::Failed, Some(&message))
                .await
            {
                error!(task_id, error = %fallback_err, "fallback FAILED status update also failed");
            }
        }

        // Best-effort: subscribers may already be gone.
        self.events
            .publish(
                task_id,
                EVENT_TASK_FAILED,
                json!({"task_id": task_id, "status": "FAILED", "error": message}),
            )
            .await;
    }

    async fn persist_failed(&self, task_id: &str, message: &str) -> DomainResult<()> {
        let mut task = self
            .task_repo
            .get(task_id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("Task not found: {task_id}")))?;

        if task.is_terminal() {
            return Ok(());
        }
        // Forward move regardless of whether RUNNING was ever persisted.
        task.status = TaskStatus::Failed;
        task.set_error_message(Some(message.to_string()));
        self.task_repo.update(&task).await
    }
}
