//! Provider routing for AI clients.
//!
//! Both providers stay constructed; the configured provider value picks
//! which one serves each call.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::models::{AiConfig, Clothing, MatchRecord, Member, OutfitPreview, OutputLanguage};
use crate::domain::ports::{AiClient, AiError, OutfitSuggestion};

use super::gemini::GeminiClient;
use super::openai::OpenAiClient;

/// Routes AI calls to the configured provider (default gemini).
pub struct AiClientRouter {
    provider: String,
    openai: Arc<OpenAiClient>,
    gemini: Arc<GeminiClient>,
}

impl AiClientRouter {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            provider: config.provider.trim().to_lowercase(),
            openai: Arc::new(OpenAiClient::new(config.openai.clone(), config.enabled)),
            gemini: Arc::new(GeminiClient::new(config.gemini.clone(), config.enabled)),
        }
    }

    fn active(&self) -> &dyn AiClient {
        if self.provider == "openai" {
            self.openai.as_ref()
        } else {
            self.gemini.as_ref()
        }
    }
}

#[async_trait]
impl AiClient for AiClientRouter {
    fn provider_name(&self) -> &'static str {
        self.active().provider_name()
    }

    async fn suggest(
        &self,
        member: &Member,
        candidates: &[Clothing],
        history: &[MatchRecord],
        scene: Option<&str>,
        language: OutputLanguage,
    ) -> Result<Vec<OutfitSuggestion>, AiError> {
        self.active().suggest(member, candidates, history, scene, language).await
    }

    async fn generate_preview(
        &self,
        member: &Member,
        selected: &[Clothing],
        scene: Option<&str>,
        language: OutputLanguage,
    ) -> Result<OutfitPreview, AiError> {
        self.active().generate_preview(member, selected, scene, language).await
    }
}
