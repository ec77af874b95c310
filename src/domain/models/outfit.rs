//! Outfit pairing result embedded in a task.

use serde::{Deserialize, Serialize};

/// Fallback reason used when the AI response leaves the reason blank.
pub const DEFAULT_OUTFIT_REASON: &str = "AI outfit recommendation";

/// Styled-preview payload for one outfit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutfitPreview {
    /// Short headline for the look
    pub title: String,
    /// One or two sentences describing the styled outfit
    pub description: String,
    /// Prompt for rendering a virtual try-on composite
    pub image_prompt: String,
}

/// One TOP + BOTTOM pairing with a score and rationale, numbered within a
/// task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outfit {
    /// 1-based sequence number, unique within the task
    pub outfit_no: u32,
    /// Resolves to a TOP-typed candidate
    pub top_id: i64,
    /// Resolves to a BOTTOM-typed candidate
    pub bottom_id: i64,
    /// Score in [0, 100]
    pub score: i32,
    /// Free-text rationale
    pub reason: String,
    /// Styled preview, generated on demand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<OutfitPreview>,
    /// Per-outfit degradation/failure warning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Legacy flattened result entry: two per outfit (top and bottom), each
/// carrying a prefixed reason string, for backward-compatible consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatResultItem {
    pub clothing_id: i64,
    pub reason: String,
    pub score: i32,
}

/// Flatten outfits into the legacy two-entries-per-outfit view.
pub fn flatten_outfits(outfits: &[Outfit]) -> Vec<FlatResultItem> {
    let mut flat = Vec::with_capacity(outfits.len() * 2);
    for outfit in outfits {
        let reason = if outfit.reason.is_empty() {
            DEFAULT_OUTFIT_REASON
        } else {
            outfit.reason.as_str()
        };
        flat.push(FlatResultItem {
            clothing_id: outfit.top_id,
            reason: format!("Outfit #{} TOP: {}", outfit.outfit_no, reason),
            score: outfit.score,
        });
        flat.push(FlatResultItem {
            clothing_id: outfit.bottom_id,
            reason: format!("Outfit #{} BOTTOM: {}", outfit.outfit_no, reason),
            score: outfit.score,
        });
    }
    flat
}
