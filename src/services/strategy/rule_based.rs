//! Rule-based recommendation for cold-start contexts.

use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, HashSet};

use crate::domain::errors::DomainResult;
use crate::domain::models::{parse_style_tags, Clothing, ClothingType, Outfit};

use super::{RecommendationDecision, RecommendationRequest, RecommendationStrategy};

const BASE_SCORE: i32 = 55;
const OVERLAP_BONUS: i32 = 12;
const SCENE_BONUS: i32 = 8;
const JITTER_RANGE: i32 = 12;
const MAX_PAIRS: usize = 3;
const FALLBACK_SCORE: i32 = 60;

/// Scores candidates by style-tag overlap with the member plus a scene
/// bonus and a little random jitter (so repeated cold starts do not pin the
/// same pairs), then pairs the best tops and bottoms index-wise.
pub struct RuleRecommendationStrategy;

#[async_trait]
impl RecommendationStrategy for RuleRecommendationStrategy {
    fn name(&self) -> &'static str {
        "RULE_BASED"
    }

    fn supports(&self, cold_start: bool) -> bool {
        cold_start
    }

    async fn recommend(
        &self,
        request: &RecommendationRequest<'_>,
    ) -> DomainResult<RecommendationDecision> {
        let scores = build_base_scores(request);

        let mut tops: Vec<&Clothing> = request
            .candidates
            .iter()
            .filter(|c| c.clothing_type == ClothingType::Top)
            .collect();
        let mut bottoms: Vec<&Clothing> = request
            .candidates
            .iter()
            .filter(|c| c.clothing_type == ClothingType::Bottom)
            .collect();

        let score_of = |c: &Clothing| scores.get(&c.id).copied().unwrap_or(FALLBACK_SCORE);
        tops.sort_by(|a, b| score_of(b).cmp(&score_of(a)));
        bottoms.sort_by(|a, b| score_of(b).cmp(&score_of(a)));

        let pair_count = MAX_PAIRS.min(tops.len()).min(bottoms.len());
        let outfits = (0..pair_count)
            .map(|i| {
                let top = tops[i];
                let bottom = bottoms[i];
                Outfit {
                    outfit_no: (i + 1) as u32,
                    top_id: top.id,
                    bottom_id: bottom.id,
                    score: score_of(top).max(score_of(bottom)),
                    reason: "Rule-based recommendation by style overlap and scene compatibility"
                        .to_string(),
                    preview: None,
                    warning: None,
                }
            })
            .collect();

        Ok(RecommendationDecision { outfits, warning: None })
    }
}

fn build_base_scores(request: &RecommendationRequest<'_>) -> HashMap<i64, i32> {
    let member_tags: HashSet<String> =
        parse_style_tags(request.member.style_tags.as_deref()).into_iter().collect();
    let scene = request.scene.unwrap_or("").to_lowercase();
    let mut rng = rand::thread_rng();

    let mut result = HashMap::new();
    for clothing in request.candidates {
        let clothing_tags = parse_style_tags(clothing.style_tags.as_deref());
        let overlap = clothing_tags.iter().filter(|tag| member_tags.contains(*tag)).count() as i32;

        let mut score = BASE_SCORE + overlap * OVERLAP_BONUS + rng.gen_range(0..JITTER_RANGE);
        if !scene.is_empty() && clothing_tags.iter().any(|tag| scene.contains(tag.as_str())) {
            score += SCENE_BONUS;
        }
        result.insert(clothing.id, score.clamp(0, 100));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ClothingStatus, Member, OutputLanguage};
    use chrono::Utc;

    fn member(tags: &str) -> Member {
        let now = Utc::now();
        Member {
            id: 1,
            name: "Mira".into(),
            body_data: None,
            style_tags: Some(tags.into()),
            photo_url: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn candidate(id: i64, kind: ClothingType, tags: &str) -> Clothing {
        let now = Utc::now();
        Clothing {
            id,
            name: format!("item-{id}"),
            image_url: None,
            style_tags: Some(tags.into()),
            status: ClothingStatus::OnShelf,
            clothing_type: kind,
            size_data: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_supports_cold_start_only() {
        let strategy = RuleRecommendationStrategy;
        assert!(strategy.supports(true));
        assert!(!strategy.supports(false));
    }

    #[tokio::test]
    async fn test_pairs_up_to_three() {
        let member = member("casual");
        let candidates = vec![
            candidate(1, ClothingType::Top, "casual"),
            candidate(2, ClothingType::Top, "street"),
            candidate(3, ClothingType::Top, "formal"),
            candidate(4, ClothingType::Top, "sporty"),
            candidate(5, ClothingType::Bottom, "casual"),
            candidate(6, ClothingType::Bottom, "street"),
            candidate(7, ClothingType::Bottom, "formal"),
            candidate(8, ClothingType::Bottom, "sporty"),
        ];

        let request = RecommendationRequest {
            member: &member,
            candidates: &candidates,
            history: &[],
            scene: None,
            language: OutputLanguage::En,
        };
        let decision = RuleRecommendationStrategy.recommend(&request).await.unwrap();

        assert_eq!(decision.outfits.len(), 3);
        for (i, outfit) in decision.outfits.iter().enumerate() {
            assert_eq!(outfit.outfit_no, (i + 1) as u32);
            assert!((0..=100).contains(&outfit.score));
        }
    }

    #[tokio::test]
    async fn test_pair_count_limited_by_scarcer_side() {
        let member = member("casual");
        let candidates = vec![
            candidate(1, ClothingType::Top, "casual"),
            candidate(2, ClothingType::Top, "street"),
            candidate(3, ClothingType::Bottom, "casual"),
        ];

        let request = RecommendationRequest {
            member: &member,
            candidates: &candidates,
            history: &[],
            scene: None,
            language: OutputLanguage::En,
        };
        let decision = RuleRecommendationStrategy.recommend(&request).await.unwrap();
        assert_eq!(decision.outfits.len(), 1);
    }

    #[tokio::test]
    async fn test_no_pairable_candidates_yields_empty() {
        let member = member("casual");
        let candidates = vec![candidate(1, ClothingType::Top, "casual")];
        let request = RecommendationRequest {
            member: &member,
            candidates: &candidates,
            history: &[],
            scene: None,
            language: OutputLanguage::En,
        };
        let decision = RuleRecommendationStrategy.recommend(&request).await.unwrap();
        assert!(decision.outfits.is_empty());
    }

    #[test]
    fn test_tag_overlap_raises_scores() {
        let member = member("casual,street");
        let matching = candidate(1, ClothingType::Top, "casual,street");
        let unrelated = candidate(2, ClothingType::Top, "formal");
        let candidates = vec![matching, unrelated];

        let request = RecommendationRequest {
            member: &member,
            candidates: &candidates,
            history: &[],
            scene: None,
            language: OutputLanguage::En,
        };
        let scores = build_base_scores(&request);

        // Two overlapping tags beat zero even with maximum jitter spread.
        assert!(scores[&1] > scores[&2]);
    }
}
