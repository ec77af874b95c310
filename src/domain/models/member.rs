//! Member profile consumed by the recommendation core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body measurements embedded in a member's `body_data` JSON.
///
/// All fields are optional in storage; [`BodyMeasurements::resolve`] falls
/// back to fixed defaults when the JSON is absent or malformed so prompt
/// building always has a complete profile to describe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyMeasurements {
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub shoulder_width_cm: Option<f64>,
    pub bust_cm: Option<f64>,
    pub waist_cm: Option<f64>,
    pub hip_cm: Option<f64>,
    pub body_shape: Option<String>,
    pub top_size: Option<String>,
    pub bottom_size: Option<String>,
}

impl Default for BodyMeasurements {
    fn default() -> Self {
        Self {
            height_cm: None,
            weight_kg: None,
            shoulder_width_cm: None,
            bust_cm: None,
            waist_cm: None,
            hip_cm: None,
            body_shape: None,
            top_size: None,
            bottom_size: None,
        }
    }
}

impl BodyMeasurements {
    /// Standard fallback profile used when a member carries no usable
    /// measurement data.
    pub fn standard() -> Self {
        Self {
            height_cm: Some(165.0),
            weight_kg: Some(50.0),
            shoulder_width_cm: Some(38.0),
            bust_cm: Some(84.0),
            waist_cm: Some(64.0),
            hip_cm: Some(90.0),
            body_shape: Some("H".to_string()),
            top_size: Some("M".to_string()),
            bottom_size: Some("M".to_string()),
        }
    }

    /// Parse measurements out of raw body-data JSON, falling back to the
    /// standard profile on absent or malformed input.
    pub fn resolve(body_data: Option<&str>) -> Self {
        let Some(raw) = body_data else {
            return Self::standard();
        };
        if raw.trim().is_empty() {
            return Self::standard();
        }
        serde_json::from_str(raw).unwrap_or_else(|_| Self::standard())
    }
}

/// A profiled person that outfits are recommended for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    /// Raw body-measurement JSON; parsed lazily via [`BodyMeasurements::resolve`]
    pub body_data: Option<String>,
    /// Comma-separated style tags
    pub style_tags: Option<String>,
    /// Reference photo for preview generation
    pub photo_url: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Whether preview generation has a usable photo reference.
    pub fn has_photo(&self) -> bool {
        self.photo_url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }

    pub fn measurements(&self) -> BodyMeasurements {
        BodyMeasurements::resolve(self.body_data.as_deref())
    }
}

/// Split a comma-separated tag string into normalized lowercase tags.
pub fn parse_style_tags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}
