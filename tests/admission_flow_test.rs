//! Admission behavior through the task service: rate limiting, dedup,
//! and backlog saturation.

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use stylecast::domain::errors::{DomainError, DomainResult};
use stylecast::domain::models::{ClothingType, MatchRecord, MatchRecordStatus, TaskStatus};
use stylecast::domain::ports::{AiClient, MatchRecordRepository, TaskRepository};
use stylecast::services::task_service::TaskSubmitter;
use stylecast::services::{
    AdmissionGatekeeper, MatchTaskService, OutfitPreviewService, RateLimiter,
};

use common::{seed_clothing, seed_member, setup, StubAiClient, TestContext};

/// Submitter that records submissions instead of running them, optionally
/// simulating a saturated backlog.
struct RecordingSubmitter {
    reject: AtomicBool,
}

impl RecordingSubmitter {
    fn accepting() -> Arc<Self> {
        Arc::new(Self { reject: AtomicBool::new(false) })
    }

    fn rejecting() -> Arc<Self> {
        Arc::new(Self { reject: AtomicBool::new(true) })
    }
}

impl TaskSubmitter for RecordingSubmitter {
    fn try_submit(&self, _task_id: &str) -> DomainResult<()> {
        if self.reject.load(Ordering::SeqCst) {
            Err(DomainError::Capacity("Task backlog is full, try again later".to_string()))
        } else {
            Ok(())
        }
    }
}

fn service_with(
    ctx: &TestContext,
    max_per_second: usize,
    submitter: Arc<dyn TaskSubmitter>,
) -> MatchTaskService {
    let gatekeeper = Arc::new(AdmissionGatekeeper::new(
        Arc::new(RateLimiter::new(max_per_second)),
        ctx.clothing_repo.clone(),
        ctx.record_repo.clone(),
    ));
    let ai_client: Arc<dyn AiClient> = Arc::new(StubAiClient::suggesting(vec![]));
    MatchTaskService::new(
        ctx.task_repo.clone(),
        ctx.member_repo.clone(),
        ctx.clothing_repo.clone(),
        ctx.record_repo.clone(),
        gatekeeper,
        Arc::new(OutfitPreviewService::new(ai_client)),
        submitter,
    )
}

#[tokio::test]
async fn rate_limit_rejects_fourth_request_in_window() {
    let ctx = setup().await;
    let member = seed_member(&ctx, None).await;
    let top = seed_clothing(&ctx, "top", ClothingType::Top, None).await;
    let service = service_with(&ctx, 3, RecordingSubmitter::accepting());

    for _ in 0..3 {
        service
            .create_task("operator-a", member.id, &[top.id], None, None)
            .await
            .unwrap();
    }

    let err = service
        .create_task("operator-a", member.id, &[top.id], None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::RateLimited(_)));

    // A different operator still gets through.
    service
        .create_task("operator-b", member.id, &[top.id], None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn blank_operator_is_unauthorized() {
    let ctx = setup().await;
    let member = seed_member(&ctx, None).await;
    let top = seed_clothing(&ctx, "top", ClothingType::Top, None).await;
    let service = service_with(&ctx, 3, RecordingSubmitter::accepting());

    let err = service.create_task("", member.id, &[top.id], None, None).await.unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized(_)));
}

#[tokio::test]
async fn dedup_rejects_recently_worn_only_request() {
    let ctx = setup().await;
    let member = seed_member(&ctx, None).await;
    let worn = seed_clothing(&ctx, "worn", ClothingType::Top, None).await;
    let fresh = seed_clothing(&ctx, "fresh", ClothingType::Top, None).await;

    let mut record = MatchRecord::draft(member.id, worn.id, None);
    record.status = MatchRecordStatus::Broadcasted;
    record.broadcast_date = Some(Utc::now() - ChronoDuration::days(2));
    ctx.record_repo.insert(&record).await.unwrap();

    let service = service_with(&ctx, 100, RecordingSubmitter::accepting());

    // Only the worn item: rejected by the worn-history rule.
    let err = service
        .create_task("op", member.id, &[worn.id], None, None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("7-day worn history rule"));

    // Replacing it with a never-worn item succeeds; the worn item is
    // filtered out of the stored candidate set.
    let response = service
        .create_task("op", member.id, &[worn.id, fresh.id], None, None)
        .await
        .unwrap();
    assert_eq!(response.status, TaskStatus::Queued);

    let task = ctx.task_repo.get(&response.task_id).await.unwrap().unwrap();
    assert_eq!(task.candidate_ids, vec![fresh.id]);
}

#[tokio::test]
async fn undoing_a_broadcast_restores_eligibility() {
    let ctx = setup().await;
    let member = seed_member(&ctx, None).await;
    let item = seed_clothing(&ctx, "item", ClothingType::Top, None).await;

    let mut record = MatchRecord::draft(member.id, item.id, None);
    record.status = MatchRecordStatus::Broadcasted;
    record.broadcast_date = Some(Utc::now() - ChronoDuration::days(1));
    let record = ctx.record_repo.insert(&record).await.unwrap();

    let service = service_with(&ctx, 100, RecordingSubmitter::accepting());
    assert!(service.create_task("op", member.id, &[item.id], None, None).await.is_err());

    // Reverting the record clears its broadcast date.
    service
        .update_history_status(member.id, record.id, MatchRecordStatus::Rejected)
        .await
        .unwrap();

    service.create_task("op", member.id, &[item.id], None, None).await.unwrap();
}

#[tokio::test]
async fn oversized_id_list_is_rejected_before_admission() {
    let ctx = setup().await;
    let member = seed_member(&ctx, None).await;
    let service = service_with(&ctx, 100, RecordingSubmitter::accepting());

    let ids: Vec<i64> = (1..=21).collect();
    let err = service.create_task("op", member.id, &ids, None, None).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let err = service.create_task("op", member.id, &[], None, None).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn saturated_backlog_parks_task_as_failed() {
    let ctx = setup().await;
    let member = seed_member(&ctx, None).await;
    let top = seed_clothing(&ctx, "top", ClothingType::Top, None).await;
    let service = service_with(&ctx, 100, RecordingSubmitter::rejecting());

    let err = service.create_task("op", member.id, &[top.id], None, None).await.unwrap_err();
    assert!(matches!(err, DomainError::Capacity(_)));

    // The parked row is terminal, never stuck QUEUED.
    let (tasks, total) = ctx.task_repo.list(Some(member.id), 0, 10).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(tasks[0].status, TaskStatus::Failed);
}

#[tokio::test]
async fn language_is_resolved_from_accept_language() {
    let ctx = setup().await;
    let member = seed_member(&ctx, None).await;
    let top = seed_clothing(&ctx, "top", ClothingType::Top, None).await;
    let service = service_with(&ctx, 100, RecordingSubmitter::accepting());

    let response = service
        .create_task("op", member.id, &[top.id], None, Some("zh-CN,zh;q=0.9"))
        .await
        .unwrap();

    let task = ctx.task_repo.get(&response.task_id).await.unwrap().unwrap();
    assert_eq!(task.language, stylecast::domain::models::OutputLanguage::Zh);
}
