//! Task orchestration facade: creation, queries, previews, and history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    flatten_outfits, truncate_message, Clothing, FlatResultItem, MatchRecord, MatchRecordStatus,
    MatchTask, Member, Outfit, OutfitPreview, OutputLanguage, TaskStatus,
};
use crate::domain::ports::{
    ClothingRepository, MatchRecordRepository, MemberRepository, TaskRepository,
};

use super::admission::AdmissionGatekeeper;
use super::preview::OutfitPreviewService;

/// Upper bound on requested candidate ids per task.
pub const MAX_REQUEST_CLOTHING_IDS: usize = 20;

/// Hands accepted tasks to the asynchronous worker pool.
///
/// Implemented by the worker pool; stubbed in tests.
pub trait TaskSubmitter: Send + Sync {
    /// Enqueue the task for execution, rejecting when the backlog is full.
    fn try_submit(&self, task_id: &str) -> DomainResult<()>;
}

/// Response to task creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskResponse {
    pub task_id: String,
    pub status: TaskStatus,
}

/// Full task detail, including the legacy flattened views.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    pub task_id: String,
    pub status: TaskStatus,
    pub strategy_name: Option<String>,
    pub outfits: Vec<Outfit>,
    /// Legacy flattened result: two entries per outfit
    pub result: Vec<FlatResultItem>,
    /// Legacy first-outfit preview
    pub preview: Option<OutfitPreview>,
    pub error_message: Option<String>,
}

/// One row in the task listing.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub member_id: i64,
    pub scene: Option<String>,
    pub status: TaskStatus,
    pub strategy_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One row in the history listing, enriched with display names.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryItem {
    pub id: i64,
    pub member_id: i64,
    pub member_name: String,
    pub clothing_id: i64,
    pub clothing_name: Option<String>,
    pub status: MatchRecordStatus,
    pub performance_score: Option<i32>,
    pub broadcast_date: Option<DateTime<Utc>>,
}

/// History listing plus the member's total record count.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryList {
    pub records: Vec<HistoryItem>,
    pub total: i64,
}

pub struct MatchTaskService {
    task_repo: Arc<dyn TaskRepository>,
    member_repo: Arc<dyn MemberRepository>,
    clothing_repo: Arc<dyn ClothingRepository>,
    record_repo: Arc<dyn MatchRecordRepository>,
    gatekeeper: Arc<AdmissionGatekeeper>,
    preview_service: Arc<OutfitPreviewService>,
    submitter: Arc<dyn TaskSubmitter>,
}

impl MatchTaskService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        member_repo: Arc<dyn MemberRepository>,
        clothing_repo: Arc<dyn ClothingRepository>,
        record_repo: Arc<dyn MatchRecordRepository>,
        gatekeeper: Arc<AdmissionGatekeeper>,
        preview_service: Arc<OutfitPreviewService>,
        submitter: Arc<dyn TaskSubmitter>,
    ) -> Self {
        Self {
            task_repo,
            member_repo,
            clothing_repo,
            record_repo,
            gatekeeper,
            preview_service,
            submitter,
        }
    }

    /// Admit and persist a new task, then hand it to the worker pool.
    /// Returns immediately with the QUEUED task id.
    pub async fn create_task(
        &self,
        operator: &str,
        member_id: i64,
        clothing_ids: &[i64],
        scene: Option<String>,
        accept_language: Option<&str>,
    ) -> DomainResult<CreateTaskResponse> {
        if clothing_ids.is_empty() || clothing_ids.len() > MAX_REQUEST_CLOTHING_IDS {
            return Err(DomainError::Validation(format!(
                "clothing_ids must contain 1 to {MAX_REQUEST_CLOTHING_IDS} entries"
            )));
        }

        self.gatekeeper.assert_allowed(operator).await?;
        self.require_member(member_id).await?;
        let candidates = self.gatekeeper.filter_candidates(member_id, clothing_ids).await?;

        let language = OutputLanguage::resolve(accept_language);
        let task = MatchTask::new(member_id, operator, scene, language, candidates);
        self.task_repo.create(&task).await?;

        if let Err(err) = self.submitter.try_submit(&task.id) {
            // The row exists but no worker will ever pick it up; park it as
            // FAILED so it cannot sit QUEUED forever.
            warn!(task_id = %task.id, %err, "task rejected by saturated worker backlog");
            let _ = self
                .task_repo
                .update_status_and_error(&task.id, TaskStatus::Failed, Some("Task backlog saturated"))
                .await;
            return Err(err);
        }

        Ok(CreateTaskResponse { task_id: task.id, status: TaskStatus::Queued })
    }

    pub async fn get_task(&self, task_id: &str) -> DomainResult<TaskDetail> {
        let task = self.require_task(task_id).await?;
        Ok(to_task_detail(&task))
    }

    pub async fn list_tasks(
        &self,
        member_id: Option<i64>,
        page: u32,
        size: u32,
    ) -> DomainResult<(Vec<TaskSummary>, i64)> {
        let (tasks, total) = self.task_repo.list(member_id, page, size).await?;
        let summaries = tasks
            .into_iter()
            .map(|task| TaskSummary {
                task_id: task.id,
                member_id: task.member_id,
                scene: task.scene,
                status: task.status,
                strategy_name: task.strategy_name,
                created_at: task.created_at,
            })
            .collect();
        Ok((summaries, total))
    }

    /// Generate (or degrade) the styled preview for one outfit of a
    /// SUCCEEDED task and merge the outcome back into the stored result.
    ///
    /// Preview failures never fail the task: the endpoint still returns the
    /// task detail, with preview left null and a per-outfit warning.
    pub async fn generate_outfit_preview(
        &self,
        task_id: &str,
        outfit_no: u32,
        accept_language: Option<&str>,
    ) -> DomainResult<TaskDetail> {
        let mut task = self.require_task(task_id).await?;
        if task.status != TaskStatus::Succeeded {
            return Err(DomainError::Validation(
                "Preview can only be generated after task succeeded".to_string(),
            ));
        }
        if task.outfits.is_empty() {
            return Err(DomainError::Validation(
                "No outfit recommendation result found for this task".to_string(),
            ));
        }

        let target_index = task
            .outfits
            .iter()
            .position(|outfit| outfit.outfit_no == outfit_no)
            .ok_or_else(|| DomainError::NotFound("Outfit not found in task result".to_string()))?;

        let member = self.require_member(task.member_id).await?;
        let target = &task.outfits[target_index];
        let clothing_map = self.resolve_clothing_map(&task.outfits).await?;
        let top = clothing_map.get(&target.top_id);
        let bottom = clothing_map.get(&target.bottom_id);
        let (Some(top), Some(bottom)) = (top, bottom) else {
            return Err(DomainError::Validation(
                "Outfit clothing references are invalid or not active".to_string(),
            ));
        };

        let language = OutputLanguage::resolve(accept_language);
        let selected = vec![top.clone(), bottom.clone()];
        let (preview, warning) = match self
            .preview_service
            .generate(&member, &selected, task.scene.as_deref(), language)
            .await
        {
            Ok(decision) => {
                (decision.preview, format_outfit_warning(outfit_no, decision.warning.as_deref()))
            }
            Err(err) => {
                let message =
                    format!("Preview skipped for outfit #{outfit_no}: {}", truncate_message(&err.to_string()));
                (None, Some(message))
            }
        };

        {
            let outfit = &mut task.outfits[target_index];
            outfit.preview = preview;
            outfit.warning = warning;
        }
        let merged =
            merge_warnings(&[task.error_message.as_deref(), collect_outfit_warnings(&task.outfits).as_deref()]);
        task.set_error_message(merged);

        self.task_repo.update(&task).await?;
        Ok(to_task_detail(&task))
    }

    pub async fn get_history(&self, member_id: i64, limit: u32) -> DomainResult<HistoryList> {
        let member = self.require_member(member_id).await?;
        let records = self.record_repo.list_recent(member_id, limit).await?;
        let names = self
            .resolve_clothing_names(records.iter().map(|r| r.clothing_id).collect::<Vec<_>>())
            .await?;
        let total = self.record_repo.count_by_member(member_id).await?;

        let records = records
            .into_iter()
            .map(|record| to_history_item(record, &member.name, &names))
            .collect();
        Ok(HistoryList { records, total })
    }

    /// Record a manually observed worn item. Status starts BROADCASTED, so
    /// the item immediately participates in dedup.
    pub async fn create_manual_history(
        &self,
        member_id: i64,
        clothing_id: i64,
        performance_score: Option<i32>,
        broadcast_date: Option<DateTime<Utc>>,
    ) -> DomainResult<HistoryItem> {
        let member = self.require_member(member_id).await?;
        let clothing = self
            .clothing_repo
            .get_active(clothing_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Clothing not found".to_string()))?;

        let mut record = MatchRecord::draft(member_id, clothing_id, performance_score);
        record.status = MatchRecordStatus::Broadcasted;
        record.broadcast_date = Some(broadcast_date.unwrap_or_else(Utc::now));

        let created = self.record_repo.insert(&record).await?;
        let mut names = HashMap::new();
        names.insert(clothing.id, clothing.name);
        Ok(to_history_item(created, &member.name, &names))
    }

    /// Update a record's lifecycle status; marking broadcast sets the date,
    /// reverting clears it so the record stops affecting dedup.
    pub async fn update_history_status(
        &self,
        member_id: i64,
        record_id: i64,
        status: MatchRecordStatus,
    ) -> DomainResult<HistoryItem> {
        let member = self.require_member(member_id).await?;
        let mut record = self
            .record_repo
            .find_by_id_and_member(record_id, member_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("History record not found".to_string()))?;

        record.apply_status(status);
        self.record_repo.update(&record).await?;

        let names = self.resolve_clothing_names(vec![record.clothing_id]).await?;
        Ok(to_history_item(record, &member.name, &names))
    }

    async fn require_task(&self, task_id: &str) -> DomainResult<MatchTask> {
        self.task_repo
            .get(task_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Task not found".to_string()))
    }

    async fn require_member(&self, member_id: i64) -> DomainResult<Member> {
        self.member_repo
            .get_active(member_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Member not found".to_string()))
    }

    async fn resolve_clothing_map(
        &self,
        outfits: &[Outfit],
    ) -> DomainResult<HashMap<i64, Clothing>> {
        let mut ids: Vec<i64> = Vec::new();
        for outfit in outfits {
            for id in [outfit.top_id, outfit.bottom_id] {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        let items = self.clothing_repo.find_active_by_ids(&ids).await?;
        Ok(items.into_iter().map(|item| (item.id, item)).collect())
    }

    async fn resolve_clothing_names(&self, ids: Vec<i64>) -> DomainResult<HashMap<i64, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let items = self.clothing_repo.find_active_by_ids(&ids).await?;
        Ok(items.into_iter().map(|item| (item.id, item.name)).collect())
    }
}

fn to_task_detail(task: &MatchTask) -> TaskDetail {
    TaskDetail {
        task_id: task.id.clone(),
        status: task.status,
        strategy_name: task.strategy_name.clone(),
        outfits: task.outfits.clone(),
        result: flatten_outfits(&task.outfits),
        preview: task.outfits.first().and_then(|outfit| outfit.preview.clone()),
        error_message: task.error_message.clone(),
    }
}

fn to_history_item(
    record: MatchRecord,
    member_name: &str,
    clothing_names: &HashMap<i64, String>,
) -> HistoryItem {
    HistoryItem {
        id: record.id,
        member_id: record.member_id,
        member_name: member_name.to_string(),
        clothing_id: record.clothing_id,
        clothing_name: clothing_names.get(&record.clothing_id).cloned(),
        status: record.status,
        performance_score: record.performance_score,
        broadcast_date: record.broadcast_date,
    }
}

/// Prefix a warning with its outfit number, unless it already carries one.
pub(crate) fn format_outfit_warning(outfit_no: u32, warning: Option<&str>) -> Option<String> {
    let warning = warning?.trim();
    if warning.is_empty() {
        return None;
    }
    if warning.starts_with("Preview skipped for outfit #") {
        return Some(warning.to_string());
    }
    Some(format!("Preview skipped for outfit #{outfit_no}: {warning}"))
}

/// Join every outfit's warning into one "; "-separated string.
pub(crate) fn collect_outfit_warnings(outfits: &[Outfit]) -> Option<String> {
    let warnings: Vec<&str> = outfits
        .iter()
        .filter_map(|outfit| outfit.warning.as_deref())
        .filter(|w| !w.trim().is_empty())
        .collect();
    if warnings.is_empty() {
        None
    } else {
        Some(warnings.join("; "))
    }
}

/// Merge warning strings: split on ";", trim, de-duplicate preserving first
/// occurrence order, re-join.
pub(crate) fn merge_warnings(sources: &[Option<&str>]) -> Option<String> {
    let mut seen = Vec::new();
    for source in sources.iter().flatten() {
        for token in source.split(';') {
            let item = token.trim();
            if !item.is_empty() && !seen.iter().any(|existing| existing == item) {
                seen.push(item.to_string());
            }
        }
    }
    if seen.is_empty() {
        None
    } else {
        Some(seen.join("; "))
    }
}
