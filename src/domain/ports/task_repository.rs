//! Task persistence port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{MatchTask, TaskStatus};

/// Persistence contract for task aggregates.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a freshly created QUEUED task.
    async fn create(&self, task: &MatchTask) -> DomainResult<()>;

    async fn get(&self, id: &str) -> DomainResult<Option<MatchTask>>;

    /// Persist a complete status/strategy/result/error snapshot.
    async fn update(&self, task: &MatchTask) -> DomainResult<()>;

    /// Minimal recovery write of `{status, error_message}` only.
    ///
    /// Used exclusively when [`TaskRepository::update`] fails mid-failure
    /// handling, so a task can never remain stuck in RUNNING because of a
    /// downstream serialization fault.
    async fn update_status_and_error(
        &self,
        id: &str,
        status: TaskStatus,
        error_message: Option<&str>,
    ) -> DomainResult<()>;

    /// Page through tasks, newest first, optionally scoped to a member.
    /// Returns the page plus the total row count.
    async fn list(
        &self,
        member_id: Option<i64>,
        page: u32,
        size: u32,
    ) -> DomainResult<(Vec<MatchTask>, i64)>;
}
