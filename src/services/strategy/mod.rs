//! Recommendation strategies and the first-match router.

pub mod ai_based;
pub mod rule_based;

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Clothing, MatchRecord, Member, Outfit, OutputLanguage};

pub use ai_based::AiRecommendationStrategy;
pub use rule_based::RuleRecommendationStrategy;

/// Inputs for one recommendation run.
pub struct RecommendationRequest<'a> {
    pub member: &'a Member,
    pub candidates: &'a [Clothing],
    pub history: &'a [MatchRecord],
    pub scene: Option<&'a str>,
    pub language: OutputLanguage,
}

/// A strategy's result: ranked outfits plus an optional warning.
#[derive(Debug, Clone)]
pub struct RecommendationDecision {
    pub outfits: Vec<Outfit>,
    pub warning: Option<String>,
}

/// A pluggable recommendation variant with a capability predicate.
#[async_trait]
pub trait RecommendationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy is usable in the given request context.
    fn supports(&self, cold_start: bool) -> bool;

    async fn recommend(
        &self,
        request: &RecommendationRequest<'_>,
    ) -> DomainResult<RecommendationDecision>;
}

/// Result of routing plus the chosen strategy's output.
#[derive(Debug, Clone)]
pub struct RecommendationOutput {
    pub strategy_name: String,
    pub outfits: Vec<Outfit>,
    pub warning: Option<String>,
}

/// Walks an ordered, extensible strategy list and runs the first one whose
/// capability predicate passes. With the default list this always resolves
/// to the AI-based strategy; the rule-based path stays pluggable without
/// code changes here.
pub struct RecommendationService {
    strategies: Vec<Arc<dyn RecommendationStrategy>>,
}

impl RecommendationService {
    pub fn new(strategies: Vec<Arc<dyn RecommendationStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn recommend(
        &self,
        request: &RecommendationRequest<'_>,
    ) -> DomainResult<RecommendationOutput> {
        // Cold start: no prior signal for this member.
        let cold_start = request.history.is_empty();

        let strategy = self
            .strategies
            .iter()
            .find(|s| s.supports(cold_start))
            .ok_or_else(|| {
                DomainError::Internal("No recommendation strategy configured".to_string())
            })?;

        let decision = strategy.recommend(request).await?;
        Ok(RecommendationOutput {
            strategy_name: strategy.name().to_string(),
            outfits: decision.outfits,
            warning: decision.warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct FixedStrategy {
        name: &'static str,
        cold_start_only: bool,
    }

    #[async_trait]
    impl RecommendationStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn supports(&self, cold_start: bool) -> bool {
            !self.cold_start_only || cold_start
        }

        async fn recommend(
            &self,
            _request: &RecommendationRequest<'_>,
        ) -> DomainResult<RecommendationDecision> {
            Ok(RecommendationDecision { outfits: Vec::new(), warning: None })
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

    #[tokio::test]
    async fn test_first_supporting_strategy_wins() {
        let service = RecommendationService::new(vec![
            Arc::new(FixedStrategy { name: "COLD_ONLY", cold_start_only: true }),
            Arc::new(FixedStrategy { name: "ALWAYS", cold_start_only: false }),
        ]);

        let member = member();
        let history = vec![MatchRecord::draft(1, 2, Some(50))];

        // Warm context skips the cold-start-only strategy.
        let request = RecommendationRequest {
            member: &member,
            candidates: &[],
            history: &history,
            scene: None,
            language: OutputLanguage::En,
        };
        let output = service.recommend(&request).await.unwrap();
        assert_eq!(output.strategy_name, "ALWAYS");

        // Cold context picks the first entry.
        let request = RecommendationRequest {
            member: &member,
            candidates: &[],
            history: &[],
            scene: None,
            language: OutputLanguage::En,
        };
        let output = service.recommend(&request).await.unwrap();
        assert_eq!(output.strategy_name, "COLD_ONLY");
    }

    #[tokio::test]
    async fn test_empty_strategy_list_errors() {
        let service = RecommendationService::new(Vec::new());
        let member = member();
        let request = RecommendationRequest {
            member: &member,
            candidates: &[],
            history: &[],
            scene: None,
            language: OutputLanguage::En,
        };
        assert!(service.recommend(&request).await.is_err());
    }
}
