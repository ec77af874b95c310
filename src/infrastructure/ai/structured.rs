//! Structured-output payloads, schemas, decoding, and normalization.
//!
//! Decoding is two-phase: the schema-shaped envelope first, then one
//! fallback attempt on the same text as a raw JSON array. Normalization is
//! the single implementation of the pairing rules shared by the AI clients
//! and the AI-based strategy.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::models::{Clothing, ClothingType, DEFAULT_OUTFIT_REASON};
use crate::domain::ports::OutfitSuggestion;

/// Raw suggestion item as produced by a provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestionPayload {
    pub top_clothing_id: Option<i64>,
    pub bottom_clothing_id: Option<i64>,
    pub score: Option<i32>,
    pub reason: Option<String>,
}

/// Schema-shaped wrapper around suggestion items.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SuggestionEnvelope {
    pub outfits: Vec<SuggestionPayload>,
}

/// Raw preview payload as produced by a provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewPayload {
    pub title: Option<String>,
    pub outfit_description: Option<String>,
    pub image_prompt: Option<String>,
}

/// JSON schema for the suggestion envelope.
pub fn suggestion_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "outfits": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "topClothingId": {"type": "integer"},
                        "bottomClothingId": {"type": "integer"},
                        "score": {"type": "integer"},
                        "reason": {"type": "string"}
                    },
                    "required": ["topClothingId", "bottomClothingId", "score", "reason"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["outfits"],
        "additionalProperties": false
    })
}

/// JSON schema for the preview payload.
pub fn preview_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "outfitDescription": {"type": "string"},
            "imagePrompt": {"type": "string"}
        },
        "required": ["title", "outfitDescription", "imagePrompt"],
        "additionalProperties": false
    })
}

/// Strip surrounding markdown code fences, if any.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").map_or(rest, str::trim).trim()
}

/// Decode suggestion items: envelope first, raw array as the one fallback.
pub fn parse_suggestions(text: &str) -> Result<Vec<SuggestionPayload>, String> {
    let body = extract_json(text);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<SuggestionEnvelope>(body) {
        Ok(envelope) => Ok(envelope.outfits),
        Err(primary) => match serde_json::from_str::<Vec<SuggestionPayload>>(body) {
            Ok(items) => Ok(items),
            Err(fallback) => Err(format!(
                "envelope decode failed ({primary}); raw array decode failed ({fallback})"
            )),
        },
    }
}

/// Decode the preview payload.
pub fn parse_preview(text: &str) -> Result<PreviewPayload, String> {
    let body = extract_json(text);
    serde_json::from_str::<PreviewPayload>(body).map_err(|e| e.to_string())
}

/// Normalize raw suggestions against the candidate set.
///
/// Clamps scores to [0, 100], defaults blank reasons, drops pairs with equal
/// or missing ids, swaps reversed TOP/BOTTOM declarations, drops pairs that
/// do not resolve to exactly one TOP and one BOTTOM, and sorts by score
/// descending.
pub fn normalize_suggestions(
    parsed: Vec<SuggestionPayload>,
    candidates: &[Clothing],
) -> Vec<OutfitSuggestion> {
    let candidate_map: HashMap<i64, &Clothing> =
        candidates.iter().map(|c| (c.id, c)).collect();

    let mut suggestions: Vec<OutfitSuggestion> = parsed
        .into_iter()
        .filter_map(|item| {
            let top_id = item.top_clothing_id?;
            let bottom_id = item.bottom_clothing_id?;
            let score = item.score?;
            if top_id == bottom_id {
                return None;
            }

            let reason = item
                .reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_OUTFIT_REASON.to_string());

            Some(OutfitSuggestion { top_id, bottom_id, score: score.clamp(0, 100), reason })
        })
        .collect();

    suggestions.sort_by(|a, b| b.score.cmp(&a.score));

    suggestions
        .into_iter()
        .filter_map(|mut suggestion| {
            let top = candidate_map.get(&suggestion.top_id)?;
            let bottom = candidate_map.get(&suggestion.bottom_id)?;

            match (top.clothing_type, bottom.clothing_type) {
                (ClothingType::Top, ClothingType::Bottom) => {}
                (ClothingType::Bottom, ClothingType::Top) => {
                    std::mem::swap(&mut suggestion.top_id, &mut suggestion.bottom_id);
                }
                _ => return None,
            }

            Some(suggestion)
        })
        .collect()
}

/// Whether a parsed preview payload carries all required, non-blank fields.
pub fn preview_is_complete(payload: &PreviewPayload) -> bool {
    let filled = |value: &Option<String>| {
        value.as_deref().is_some_and(|v| !v.trim().is_empty())
    };
    filled(&payload.title) && filled(&payload.outfit_description) && filled(&payload.image_prompt)
}
