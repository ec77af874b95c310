//! Match task aggregate and its state machine.
//!
//! A task is one asynchronous unit of recommendation work. Status moves
//! strictly forward: QUEUED -> RUNNING -> {SUCCEEDED, FAILED}. Terminal
//! states absorb; tasks are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::language::OutputLanguage;
use super::outfit::Outfit;

/// Stored error/warning text is cut at this length.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 1000;

/// Status of a match task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepted and waiting for a worker
    Queued,
    /// Picked up by a worker
    Running,
    /// Finished with a result
    Succeeded,
    /// Finished with an error
    Failed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Queued
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QUEUED" => Some(Self::Queued),
            "RUNNING" => Some(Self::Running),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<TaskStatus> {
        match self {
            Self::Queued => vec![Self::Running],
            Self::Running => vec![Self::Succeeded, Self::Failed],
            Self::Succeeded | Self::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// Persistent task aggregate for asynchronous match execution.
///
/// Holds the dedup-filtered candidate set (fixed at creation), the ranked
/// outfit result once produced, and an accumulated error/warning message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTask {
    /// Opaque identifier (UUIDv4 string)
    pub id: String,
    /// Subject member
    pub member_id: i64,
    /// Operator who requested the task
    pub operator: String,
    /// Scene label (e.g. "commute", "party")
    pub scene: Option<String>,
    /// Output language for AI-generated text
    pub language: OutputLanguage,
    /// Current status
    pub status: TaskStatus,
    /// Strategy that produced the result
    pub strategy_name: Option<String>,
    /// Candidate clothing ids after dedup filtering; fixed at creation
    pub candidate_ids: Vec<i64>,
    /// Ranked outfit result
    pub outfits: Vec<Outfit>,
    /// Accumulated error/warning message, truncated to 1000 chars
    pub error_message: Option<String>,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl MatchTask {
    /// Create a new QUEUED task with a fresh id.
    pub fn new(
        member_id: i64,
        operator: impl Into<String>,
        scene: Option<String>,
        language: OutputLanguage,
        candidate_ids: Vec<i64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            member_id,
            operator: operator.into(),
            scene,
            language,
            status: TaskStatus::Queued,
            strategy_name: None,
            candidate_ids,
            outfits: Vec::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_transition_to(&self, new_status: TaskStatus) -> bool {
        self.status.can_transition_to(new_status)
    }

    /// Transition to a new status, rejecting regressions.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<(), String> {
        if !self.can_transition_to(new_status) {
            return Err(format!(
                "cannot transition from {} to {}",
                self.status.as_str(),
                new_status.as_str()
            ));
        }
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Replace the accumulated message, truncating to the storage limit.
    pub fn set_error_message(&mut self, message: Option<String>) {
        self.error_message = message.map(|m| truncate_message(&m));
    }
}

/// Cut a message to [`MAX_ERROR_MESSAGE_LENGTH`] characters.
pub fn truncate_message(value: &str) -> String {
    if value.chars().count() <= MAX_ERROR_MESSAGE_LENGTH {
        return value.to_string();
    }
    value.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect()
}
