//! Domain error types shared across services and adapters.

use thiserror::Error;

use crate::domain::ports::ai_client::AiError;

/// Result alias used throughout the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;

/// Errors surfaced by domain operations.
///
/// The API layer maps these onto HTTP statuses; everything else propagates
/// them with `?`.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Requested entity does not exist (or is soft-deleted).
    #[error("{0}")]
    NotFound(String),

    /// Request failed validation before any work started.
    #[error("{0}")]
    Validation(String),

    /// Missing or blank operator identity.
    #[error("{0}")]
    Unauthorized(String),

    /// Per-operator admission rate limit exceeded.
    #[error("{0}")]
    RateLimited(String),

    /// Worker backlog saturated; the task was not accepted.
    #[error("{0}")]
    Capacity(String),

    /// Database access failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// AI provider call failed.
    #[error(transparent)]
    Ai(#[from] AiError),

    /// Anything else that should read as a server-side fault.
    #[error("{0}")]
    Internal(String),
}

impl DomainError {
    /// Whether this error is caused by the caller's request rather than the
    /// system's own state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Validation(_) | Self::Unauthorized(_) | Self::RateLimited(_)
        )
    }
}
