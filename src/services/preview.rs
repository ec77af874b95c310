//! On-demand styled-preview generation with a degradation policy.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Clothing, Member, OutfitPreview, OutputLanguage};
use crate::domain::ports::AiClient;

/// Fixed warning used when the preview is skipped without a provider call.
pub const PREVIEW_DEGRADED_WARNING: &str =
    "Preview skipped: missing member photo or clothing image";

/// Outcome of one preview attempt: either a preview or a degradation
/// warning, never both.
#[derive(Debug, Clone)]
pub struct PreviewDecision {
    pub preview: Option<OutfitPreview>,
    pub warning: Option<String>,
}

/// Decides between degrading and calling the provider, and treats unusable
/// provider output as a hard failure.
pub struct OutfitPreviewService {
    ai_client: Arc<dyn AiClient>,
}

impl OutfitPreviewService {
    pub fn new(ai_client: Arc<dyn AiClient>) -> Self {
        Self { ai_client }
    }

    /// Generate a preview for the selected items.
    ///
    /// Missing member photo, missing item image, or an empty selection
    /// degrade without calling the provider. A provider response with any
    /// blank required field is a hard failure: the provider was invoked but
    /// produced unusable output.
    pub async fn generate(
        &self,
        member: &Member,
        selected: &[Clothing],
        scene: Option<&str>,
        language: OutputLanguage,
    ) -> DomainResult<PreviewDecision> {
        if should_skip(member, selected) {
            return Ok(PreviewDecision {
                preview: None,
                warning: Some(PREVIEW_DEGRADED_WARNING.to_string()),
            });
        }

        let preview = self.ai_client.generate_preview(member, selected, scene, language).await?;

        if preview.title.trim().is_empty()
            || preview.description.trim().is_empty()
            || preview.image_prompt.trim().is_empty()
        {
            return Err(DomainError::Internal("AI preview generation unavailable".to_string()));
        }

        Ok(PreviewDecision { preview: Some(preview), warning: None })
    }
}

fn should_skip(member: &Member, selected: &[Clothing]) -> bool {
    if !member.has_photo() {
        return true;
    }
    if selected.is_empty() {
        return true;
    }
    selected.iter().any(|clothing| !clothing.has_image())
}
