//! Clothing catalog item consumed by the recommendation core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared garment type. Every outfit pairs exactly one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClothingType {
    Top,
    Bottom,
}

impl ClothingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "TOP",
            Self::Bottom => "BOTTOM",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "TOP" => Some(Self::Top),
            "BOTTOM" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Shelf status. Only ON_SHELF items are eligible candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClothingStatus {
    OnShelf,
    OffShelf,
}

impl Default for ClothingStatus {
    fn default() -> Self {
        Self::OnShelf
    }
}

impl ClothingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnShelf => "ON_SHELF",
            Self::OffShelf => "OFF_SHELF",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ON_SHELF" => Some(Self::OnShelf),
            "OFF_SHELF" => Some(Self::OffShelf),
            _ => None,
        }
    }
}

/// One catalog garment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clothing {
    pub id: i64,
    pub name: String,
    /// Reference image for preview generation
    pub image_url: Option<String>,
    /// Comma-separated style tags
    pub style_tags: Option<String>,
    pub status: ClothingStatus,
    pub clothing_type: ClothingType,
    /// Size measurements as JSON (shoulderWidthCm, bustCm, waistCm, hipCm,
    /// lengthCm, sleeveLengthCm, inseamCm, topSize, bottomSize)
    pub size_data: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Clothing {
    /// Whether preview generation has a usable image reference.
    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}
