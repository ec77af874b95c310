//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::models::{Clothing, MatchRecord, Member, OpenAiConfig, OutfitPreview, OutputLanguage};
use crate::domain::ports::{AiClient, AiError, AiErrorKind, AiOperation, OutfitSuggestion};

use super::images::ImageFetcher;
use super::prompt::{build_preview_prompt, build_suggestion_prompt};
use super::retry::PreviewRetryPolicy;
use super::structured::{
    normalize_suggestions, parse_preview, parse_suggestions, preview_is_complete,
    preview_schema, suggestion_schema,
};

const PROVIDER: &str = "OpenAI";

pub struct OpenAiClient {
    config: OpenAiConfig,
    enabled: bool,
    http: reqwest::Client,
    images: ImageFetcher,
    retry: PreviewRetryPolicy,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig, enabled: bool) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms.max(1000)))
            .timeout(Duration::from_millis(config.read_timeout_ms.max(1000)))
            .build()
            .unwrap_or_default();
        let images = ImageFetcher::new(config.connect_timeout_ms, config.read_timeout_ms);
        let retry =
            PreviewRetryPolicy::new(config.preview_max_retries, config.preview_retry_backoff_ms);
        Self { config, enabled, http, images, retry }
    }

    fn err(&self, operation: AiOperation, kind: AiErrorKind) -> AiError {
        AiError::new(PROVIDER, operation, kind)
    }

    fn ensure_ready(&self, operation: AiOperation) -> Result<(), AiError> {
        if !self.enabled {
            return Err(self.err(operation, AiErrorKind::Disabled));
        }
        if self.config.api_key.trim().is_empty() {
            return Err(self.err(operation, AiErrorKind::MissingApiKey));
        }
        Ok(())
    }

    /// Normalized chat completions endpoint: base url with exactly one
    /// trailing `/v1`.
    fn chat_url(&self) -> String {
        let mut base = self.config.base_url.trim().trim_end_matches('/').to_string();
        if base.is_empty() {
            base = "https://api.openai.com".to_string();
        }
        if !base.ends_with("/v1") {
            base.push_str("/v1");
        }
        format!("{base}/chat/completions")
    }

    async fn chat(
        &self,
        operation: AiOperation,
        messages: &Value,
        response_format: Value,
    ) -> Result<String, AiError> {
        let body = json!({
            "model": self.config.model,
            "temperature": 0.2,
            "messages": messages,
            "response_format": response_format,
        });

        let response = self
            .http
            .post(self.chat_url())
            .bearer_auth(self.config.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.err(operation, request_error_kind(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.err(operation, request_error_kind(&e)))?;

        if !status.is_success() {
            return Err(self.err(
                operation,
                AiErrorKind::Http { status: status.as_u16(), message: text },
            ));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| self.err(operation, AiErrorKind::Parse(e.to_string())))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        debug!(provider = PROVIDER, operation = operation.as_str(), length = content.len(), "chat response received");
        Ok(content)
    }

    /// Attempt A: strict schema-constrained response. Attempt B (only when
    /// the provider reports the schema mode itself as unsupported): loose
    /// JSON-only mode.
    async fn chat_with_structured_fallback(
        &self,
        operation: AiOperation,
        messages: &Value,
        schema_name: &str,
        schema: Value,
    ) -> Result<String, AiError> {
        let strict_format = json!({
            "type": "json_schema",
            "json_schema": {"name": schema_name, "strict": true, "schema": schema},
        });

        match self.chat(operation, messages, strict_format).await {
            Ok(content) => Ok(content),
            Err(err) if err.is_schema_unsupported() => {
                warn!(provider = PROVIDER, operation = operation.as_str(), %err, "falling back to JSON-only mode");
                self.chat(operation, messages, json!({"type": "json_object"})).await
            }
            Err(err) => Err(err),
        }
    }

    async fn image_part(&self, operation: AiOperation, url: Option<&str>) -> Result<Value, AiError> {
        let url = url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| self.err(operation, AiErrorKind::Image("image URL is missing".into())))?;

        let rendered = if self.config.use_data_url_images {
            self.images
                .fetch(url)
                .await
                .map_err(|e| self.err(operation, AiErrorKind::Image(e)))?
                .data_url()
        } else {
            url.to_string()
        };

        Ok(json!({"type": "image_url", "image_url": {"url": rendered, "detail": "high"}}))
    }

    async fn preview_messages(
        &self,
        member: &Member,
        selected: &[Clothing],
        scene: Option<&str>,
        language: OutputLanguage,
    ) -> Result<Value, AiError> {
        let operation = AiOperation::PreviewGeneration;
        let prompt = build_preview_prompt(member, selected, scene, language);

        let mut parts = vec![
            json!({"type": "text", "text": prompt}),
            json!({"type": "text", "text": "Reference image [member_photo]: keep identity and body shape."}),
        ];
        parts.push(self.image_part(operation, member.photo_url.as_deref()).await?);

        for clothing in selected {
            parts.push(json!({
                "type": "text",
                "text": format!(
                    "Reference image [clothing] id={}, type={}, name={}. Preserve garment details.",
                    clothing.id,
                    clothing.clothing_type.as_str(),
                    clothing.name
                ),
            }));
            parts.push(self.image_part(operation, clothing.image_url.as_deref()).await?);
        }

        Ok(json!([{"role": "user", "content": parts}]))
    }
}

#[async_trait]
impl AiClient for OpenAiClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn suggest(
        &self,
        member: &Member,
        candidates: &[Clothing],
        history: &[MatchRecord],
        scene: Option<&str>,
        language: OutputLanguage,
    ) -> Result<Vec<OutfitSuggestion>, AiError> {
        let operation = AiOperation::Suggestion;
        self.ensure_ready(operation)?;

        let prompt = build_suggestion_prompt(member, candidates, history, scene, language);
        let messages = json!([{"role": "user", "content": prompt}]);

        let content = self
            .chat_with_structured_fallback(operation, &messages, "outfit_suggestions", suggestion_schema())
            .await?;

        let parsed = parse_suggestions(&content)
            .map_err(|e| self.err(operation, AiErrorKind::Parse(e)))?;
        let normalized = normalize_suggestions(parsed, candidates);
        if normalized.is_empty() {
            return Err(self.err(
                operation,
                AiErrorKind::EmptyResult(
                    "response contains no valid outfit recommendations".to_string(),
                ),
            ));
        }
        Ok(normalized)
    }

    async fn generate_preview(
        &self,
        member: &Member,
        selected: &[Clothing],
        scene: Option<&str>,
        language: OutputLanguage,
    ) -> Result<OutfitPreview, AiError> {
        let operation = AiOperation::PreviewGeneration;
        self.ensure_ready(operation)?;
        if selected.is_empty() {
            return Err(self.err(
                operation,
                AiErrorKind::EmptyResult("no selected clothing".to_string()),
            ));
        }

        let messages = self.preview_messages(member, selected, scene, language).await?;

        self.retry
            .execute(|| {
                let messages = messages.clone();
                async move {
                    let content = self
                        .chat_with_structured_fallback(
                            operation,
                            &messages,
                            "outfit_preview",
                            preview_schema(),
                        )
                        .await?;

                    let payload = parse_preview(&content)
                        .map_err(|e| self.err(operation, AiErrorKind::Parse(e)))?;
                    if !preview_is_complete(&payload) {
                        return Err(self.err(operation, AiErrorKind::MissingPreviewFields));
                    }
                    Ok(OutfitPreview {
                        title: payload.title.unwrap_or_default().trim().to_string(),
                        description: payload.outfit_description.unwrap_or_default().trim().to_string(),
                        image_prompt: payload.image_prompt.unwrap_or_default().trim().to_string(),
                    })
                }
            })
            .await
    }
}

fn request_error_kind(error: &reqwest::Error) -> AiErrorKind {
    if error.is_timeout() {
        AiErrorKind::Timeout(error.to_string())
    } else {
        AiErrorKind::Network(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
