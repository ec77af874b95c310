//! Gemini generateContent client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::models::{Clothing, GeminiConfig, MatchRecord, Member, OutfitPreview, OutputLanguage};
use crate::domain::ports::{AiClient, AiError, AiErrorKind, AiOperation, OutfitSuggestion};

use super::images::ImageFetcher;
use super::prompt::{build_preview_prompt, build_suggestion_prompt};
use super::retry::PreviewRetryPolicy;
use super::structured::{
    normalize_suggestions, parse_preview, parse_suggestions, preview_is_complete,
    preview_schema, suggestion_schema,
};

const PROVIDER: &str = "Gemini";

pub struct GeminiClient {
    config: GeminiConfig,
    enabled: bool,
    http: reqwest::Client,
    images: ImageFetcher,
    retry: PreviewRetryPolicy,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, enabled: bool) -> Self {
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

    fn generate_url(&self) -> String {
        let base = self.config.base_url.trim().trim_end_matches('/');
        format!("{base}/v1beta/models/{}:generateContent", self.config.model)
    }

    async fn generate(
        &self,
        operation: AiOperation,
        contents: &Value,
        generation_config: Value,
    ) -> Result<String, AiError> {
        let body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });

        let response = self
            .http
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key.trim())
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

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| self.err(operation, AiErrorKind::Parse(e.to_string())))?;
        let content = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content.parts.into_iter().filter_map(|part| part.text).collect::<Vec<_>>().join("")
            })
            .unwrap_or_default();

        debug!(provider = PROVIDER, operation = operation.as_str(), length = content.len(), "generateContent response received");
        Ok(content)
    }

    /// Attempt A: schema-constrained JSON response. Attempt B (only when the
    /// schema mode itself is reported unsupported): plain JSON mime type.
    async fn generate_with_structured_fallback(
        &self,
        operation: AiOperation,
        contents: &Value,
        schema: Value,
    ) -> Result<String, AiError> {
        let strict_config = json!({
            "temperature": 0.2,
            "responseMimeType": "application/json",
            "responseSchema": strip_schema_extras(schema),
        });

        match self.generate(operation, contents, strict_config).await {
            Ok(content) => Ok(content),
            Err(err) if err.is_schema_unsupported() => {
                warn!(provider = PROVIDER, operation = operation.as_str(), %err, "falling back to JSON-only mode");
                let loose_config = json!({
                    "temperature": 0.2,
                    "responseMimeType": "application/json",
                });
                self.generate(operation, contents, loose_config).await
            }
            Err(err) => Err(err),
        }
    }

    async fn image_part(&self, operation: AiOperation, url: Option<&str>) -> Result<Value, AiError> {
        let url = url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| self.err(operation, AiErrorKind::Image("image URL is missing".into())))?;

        let attachment = self
            .images
            .fetch(url)
            .await
            .map_err(|e| self.err(operation, AiErrorKind::Image(e)))?;

        Ok(json!({
            "inline_data": {"mime_type": attachment.mime_type, "data": attachment.base64}
        }))
    }

    async fn preview_contents(
        &self,
        member: &Member,
        selected: &[Clothing],
        scene: Option<&str>,
        language: OutputLanguage,
    ) -> Result<Value, AiError> {
        let operation = AiOperation::PreviewGeneration;
        let prompt = build_preview_prompt(member, selected, scene, language);

        let mut parts = vec![
            json!({"text": prompt}),
            json!({"text": "Reference image [member_photo]: keep identity and body shape."}),
        ];
        parts.push(self.image_part(operation, member.photo_url.as_deref()).await?);

        for clothing in selected {
            parts.push(json!({
                "text": format!(
                    "Reference image [clothing] id={}, type={}, name={}. Preserve garment details.",
                    clothing.id,
                    clothing.clothing_type.as_str(),
                    clothing.name
                ),
            }));
            parts.push(self.image_part(operation, clothing.image_url.as_deref()).await?);
        }

        Ok(json!([{"role": "user", "parts": parts}]))
    }
}

#[async_trait]
impl AiClient for GeminiClient {
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
        let contents = json!([{"role": "user", "parts": [{"text": prompt}]}]);

        let content = self
            .generate_with_structured_fallback(operation, &contents, suggestion_schema())
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

        let contents = self.preview_contents(member, selected, scene, language).await?;

        self.retry
            .execute(|| {
                let contents = contents.clone();
                async move {
                    let content = self
                        .generate_with_structured_fallback(operation, &contents, preview_schema())
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

/// Gemini's schema dialect rejects `additionalProperties`; strip it
/// recursively before sending.
fn strip_schema_extras(mut schema: Value) -> Value {
    fn walk(value: &mut Value) {
        if let Value::Object(map) = value {
            map.remove("additionalProperties");
            for child in map.values_mut() {
                walk(child);
            }
        } else if let Value::Array(items) = value {
            for child in items {
                walk(child);
            }
        }
    }
    walk(&mut schema);
    schema
}

fn request_error_kind(error: &reqwest::Error) -> AiErrorKind {
    if error.is_timeout() {
        AiErrorKind::Timeout(error.to_string())
    } else {
        AiErrorKind::Network(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ClothingStatus, ClothingType};
    use chrono::Utc;

    fn member() -> Member {
        let now = Utc::now();
        Member {
            id: 1,
            name: "Mira".into(),
            body_data: None,
            style_tags: None,
            photo_url: Some("https://cdn.example.com/mira.jpg".into()),
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn candidate(id: i64, kind: ClothingType) -> Clothing {
        let now = Utc::now();
        Clothing {
            id,
            name: format!("item-{id}"),
            image_url: Some(format!("https://cdn.example.com/{id}.jpg")),
            style_tags: None,
            status: ClothingStatus::OnShelf,
            clothing_type: kind,
            size_data: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn client_for(server: &mockito::Server) -> GeminiClient {
        let config = GeminiConfig {
            base_url: server.url(),
            api_key: "test-key".into(),
            model: "gemini-test".into(),
            connect_timeout_ms: 1000,
            read_timeout_ms: 2000,
            preview_max_retries: 0,
            preview_retry_backoff_ms: 1,
        };
        GeminiClient::new(config, true)
    }

    fn generate_body(text: &str) -> String {
        serde_json::to_string(&json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_suggest_happy_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(generate_body(
                r#"{"outfits": [{"topClothingId": 1, "bottomClothingId": 2, "score": 75, "reason": "relaxed"}]}"#,
            ))
            .create_async()
            .await;

        let client = client_for(&server);
        let candidates = vec![candidate(1, ClothingType::Top), candidate(2, ClothingType::Bottom)];
        let suggestions = client
            .suggest(&member(), &candidates, &[], None, OutputLanguage::En)
            .await
            .unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].reason, "relaxed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_fast() {
        let config = GeminiConfig { api_key: String::new(), ..GeminiConfig::default() };
        let client = GeminiClient::new(config, true);
        let err = client
            .suggest(&member(), &[], &[], None, OutputLanguage::En)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API key is missing"));
    }

    #[test]
    fn test_strip_schema_extras() {
        let schema = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "outfits": {
                    "type": "array",
                    "items": {"type": "object", "additionalProperties": false}
                }
            }
        });
        let stripped = strip_schema_extras(schema);
        assert!(stripped.get("additionalProperties").is_none());
        assert!(stripped["properties"]["outfits"]["items"].get("additionalProperties").is_none());
    }
}
