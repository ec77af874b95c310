//! AI-based recommendation strategy.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Outfit;
use crate::domain::ports::AiClient;
use crate::infrastructure::ai::structured::{normalize_suggestions, SuggestionPayload};

use super::{RecommendationDecision, RecommendationRequest, RecommendationStrategy};

/// Delegates to the AI provider client and re-validates its pairings with
/// the shared normalization rules. Fails loudly when nothing valid remains:
/// an empty recommendation is an error, never a silent empty result.
pub struct AiRecommendationStrategy {
    client: Arc<dyn AiClient>,
}

impl AiRecommendationStrategy {
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecommendationStrategy for AiRecommendationStrategy {
    fn name(&self) -> &'static str {
        "AI_ONLY"
    }

    fn supports(&self, _cold_start: bool) -> bool {
        true
    }

    async fn recommend(
        &self,
        request: &RecommendationRequest<'_>,
    ) -> DomainResult<RecommendationDecision> {
        let suggestions = self
            .client
            .suggest(
                request.member,
                request.candidates,
                request.history,
                request.scene,
                request.language,
            )
            .await?;

        // Re-run the shared pairing rules over the provider output; a
        // misbehaving client cannot smuggle invalid pairs past this point.
        let payloads: Vec<SuggestionPayload> = suggestions
            .into_iter()
            .map(|s| SuggestionPayload {
                top_clothing_id: Some(s.top_id),
                bottom_clothing_id: Some(s.bottom_id),
                score: Some(s.score),
                reason: Some(s.reason),
            })
            .collect();
        let validated = normalize_suggestions(payloads, request.candidates);

        if validated.is_empty() {
            return Err(DomainError::Internal(
                "AI outfit recommendation unavailable or invalid".to_string(),
            ));
        }

        let outfits = validated
            .into_iter()
            .enumerate()
            .map(|(i, suggestion)| Outfit {
                outfit_no: (i + 1) as u32,
                top_id: suggestion.top_id,
                bottom_id: suggestion.bottom_id,
                score: suggestion.score,
                reason: suggestion.reason,
                preview: None,
                warning: None,
            })
            .collect();

        Ok(RecommendationDecision { outfits, warning: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        Clothing, ClothingStatus, ClothingType, MatchRecord, Member, OutfitPreview, OutputLanguage,
    };
    use crate::domain::ports::{AiError, AiErrorKind, AiOperation, OutfitSuggestion};
    use chrono::Utc;

    struct StubAiClient {
        suggestions: Vec<OutfitSuggestion>,
    }

    #[async_trait]
    impl AiClient for StubAiClient {
        fn provider_name(&self) -> &'static str {
            "Stub"
        }

        async fn suggest(
            &self,
            _member: &Member,
            _candidates: &[Clothing],
            _history: &[MatchRecord],
            _scene: Option<&str>,
            _language: OutputLanguage,
        ) -> Result<Vec<OutfitSuggestion>, AiError> {
            Ok(self.suggestions.clone())
        }

        async fn generate_preview(
            &self,
            _member: &Member,
            _selected: &[Clothing],
            _scene: Option<&str>,
            _language: OutputLanguage,
        ) -> Result<OutfitPreview, AiError> {
            Err(AiError::new("Stub", AiOperation::PreviewGeneration, AiErrorKind::Disabled))
        }
    }

    fn member() -> Member {
        let now = Utc::now();
        Member {
            id: 1,
            name: "Mira".into(),
            body_data: None,
            style_tags: None,
            photo_url: None,
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
            image_url: None,
            style_tags: None,
            status: ClothingStatus::OnShelf,
            clothing_type: kind,
            size_data: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn suggestion(top_id: i64, bottom_id: i64, score: i32) -> OutfitSuggestion {
        OutfitSuggestion { top_id, bottom_id, score, reason: "fits".into() }
    }

    #[tokio::test]
    async fn test_numbers_outfits_sequentially() {
        let strategy = AiRecommendationStrategy::new(Arc::new(StubAiClient {
            suggestions: vec![suggestion(1, 2, 90), suggestion(3, 4, 70)],
        }));
        let member = member();
        let candidates = vec![
            candidate(1, ClothingType::Top),
            candidate(2, ClothingType::Bottom),
            candidate(3, ClothingType::Top),
            candidate(4, ClothingType::Bottom),
        ];

        let request = RecommendationRequest {
            member: &member,
            candidates: &candidates,
            history: &[],
            scene: None,
            language: OutputLanguage::En,
        };
        let decision = strategy.recommend(&request).await.unwrap();

        assert_eq!(decision.outfits.len(), 2);
        assert_eq!(decision.outfits[0].outfit_no, 1);
        assert_eq!(decision.outfits[1].outfit_no, 2);
        assert!(decision.outfits[0].score >= decision.outfits[1].score);
    }

    #[tokio::test]
    async fn test_zero_valid_outfits_is_an_error() {
        // The suggested pair does not resolve against the candidate set.
        let strategy = AiRecommendationStrategy::new(Arc::new(StubAiClient {
            suggestions: vec![suggestion(98, 99, 80)],
        }));
        let member = member();
        let candidates = vec![candidate(1, ClothingType::Top), candidate(2, ClothingType::Bottom)];

        let request = RecommendationRequest {
            member: &member,
            candidates: &candidates,
            history: &[],
            scene: None,
            language: OutputLanguage::En,
        };
        let err = strategy.recommend(&request).await.unwrap_err();
        assert!(err.to_string().contains("AI outfit recommendation unavailable"));
    }

    #[tokio::test]
    async fn test_reversed_pair_is_reordered() {
        let strategy = AiRecommendationStrategy::new(Arc::new(StubAiClient {
            // BOTTOM listed in the top slot.
            suggestions: vec![suggestion(2, 1, 64)],
        }));
        let member = member();
        let candidates = vec![candidate(1, ClothingType::Top), candidate(2, ClothingType::Bottom)];

        let request = RecommendationRequest {
            member: &member,
            candidates: &candidates,
            history: &[],
            scene: None,
            language: OutputLanguage::En,
        };
        let decision = strategy.recommend(&request).await.unwrap();
        assert_eq!(decision.outfits[0].top_id, 1);
        assert_eq!(decision.outfits[0].bottom_id, 2);
    }
}
