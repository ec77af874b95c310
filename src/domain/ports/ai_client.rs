//! AI provider client port.
//!
//! Abstracts the chat backends that produce outfit suggestions and styled
//! previews. Two interchangeable implementations exist (OpenAI-compatible
//! and Gemini), selected at call time by a configuration value.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{Clothing, MatchRecord, Member, OutfitPreview, OutputLanguage};

/// One ranked pairing suggested by a provider, already normalized: ids
/// resolve to one TOP and one BOTTOM candidate, score clamped to [0, 100],
/// reason non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutfitSuggestion {
    pub top_id: i64,
    pub bottom_id: i64,
    pub score: i32,
    pub reason: String,
}

/// Which provider operation an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiOperation {
    Suggestion,
    PreviewGeneration,
}

impl AiOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suggestion => "suggestion",
            Self::PreviewGeneration => "preview generation",
        }
    }
}

/// Failure cause, before provider/operation tagging.
#[derive(Debug, Clone, Error)]
pub enum AiErrorKind {
    #[error("AI is disabled")]
    Disabled,

    #[error("API key is missing")]
    MissingApiKey,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("invalid structured output: {0}")]
    Parse(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("response missing required preview fields")]
    MissingPreviewFields,

    #[error("unable to load image: {0}")]
    Image(String),
}

/// Provider error, tagged with provider name and operation for
/// diagnosability.
#[derive(Debug, Clone)]
pub struct AiError {
    pub provider: String,
    pub operation: AiOperation,
    pub kind: AiErrorKind,
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} failed: {}", self.provider, self.operation.as_str(), self.kind)
    }
}

impl std::error::Error for AiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl AiError {
    pub fn new(provider: impl Into<String>, operation: AiOperation, kind: AiErrorKind) -> Self {
        Self { provider: provider.into(), operation, kind }
    }

    /// Whether this error is timeout-classified. Only these are retried
    /// during preview generation.
    pub fn is_timeout(&self) -> bool {
        match &self.kind {
            AiErrorKind::Timeout(_) => true,
            AiErrorKind::Network(message) | AiErrorKind::Http { message, .. } => {
                message_mentions_timeout(message)
            }
            _ => false,
        }
    }

    /// Whether the provider reported that the schema-constrained response
    /// mode itself is unsupported. Only then does the client fall back to a
    /// loose JSON-only request.
    pub fn is_schema_unsupported(&self) -> bool {
        match &self.kind {
            AiErrorKind::Http { message, .. } | AiErrorKind::Network(message) => {
                message_mentions_schema(message)
            }
            _ => false,
        }
    }
}

fn message_mentions_timeout(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("timed out") || lower.contains("timeout")
}

fn message_mentions_schema(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("json schema")
        || lower.contains("response_format")
        || lower.contains("response format")
        || lower.contains("response_schema")
}

/// Capability contract implemented per provider.
///
/// Implementations must be `Send + Sync` for concurrent use across workers.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Provider name used for routing and error tagging.
    fn provider_name(&self) -> &'static str;

    /// Suggest ranked TOP+BOTTOM pairings for the member out of the
    /// candidate set. History entries are context only, never filtering.
    async fn suggest(
        &self,
        member: &Member,
        candidates: &[Clothing],
        history: &[MatchRecord],
        scene: Option<&str>,
        language: OutputLanguage,
    ) -> Result<Vec<OutfitSuggestion>, AiError>;

    /// Generate a styled preview for the selected items, attaching the
    /// member photo and item images.
    async fn generate_preview(
        &self,
        member: &Member,
        selected: &[Clothing],
        scene: Option<&str>,
        language: OutputLanguage,
    ) -> Result<OutfitPreview, AiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(message: &str) -> AiError {
        AiError::new(
            "OpenAI",
            AiOperation::Suggestion,
            AiErrorKind::Http { status: 400, message: message.to_string() },
        )
    }

    #[test]
    fn test_timeout_classification() {
        let err = AiError::new(
            "Gemini",
            AiOperation::PreviewGeneration,
            AiErrorKind::Timeout("read".into()),
        );
        assert!(err.is_timeout());
        assert!(http_error("connection timed out").is_timeout());
        assert!(!http_error("invalid api key").is_timeout());
    }

    #[test]
    fn test_schema_unsupported_classification() {
        assert!(http_error("response_format is not supported for this model").is_schema_unsupported());
        assert!(http_error("JSON Schema mode unavailable").is_schema_unsupported());
        assert!(!http_error("rate limit exceeded").is_schema_unsupported());
        // Parse failures never trigger the loose-JSON fallback.
        let parse = AiError::new(
            "OpenAI",
            AiOperation::Suggestion,
            AiErrorKind::Parse("unexpected token".into()),
        );
        assert!(!parse.is_schema_unsupported());
    }

    #[test]
    fn test_error_display_carries_provider_and_operation() {
        let err = http_error("boom");
        assert_eq!(err.to_string(), "OpenAI suggestion failed: HTTP 400: boom");
    }
}
