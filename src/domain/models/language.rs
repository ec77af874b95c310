//! Output-language selection for AI-generated text.

use serde::{Deserialize, Serialize};

/// Supported output languages for recommendation reasons and previews.
///
/// Resolved from the request's `Accept-Language` header with English as the
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLanguage {
    Zh,
    En,
    Ko,
}

impl Default for OutputLanguage {
    fn default() -> Self {
        Self::En
    }
}

impl OutputLanguage {
    /// Language code stored with the task.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
            Self::Ko => "ko",
        }
    }

    /// Label embedded in prompts ("write the reason in {label}").
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Self::Zh => "Chinese",
            Self::En => "English",
            Self::Ko => "Korean",
        }
    }

    /// Parse a stored language code, defaulting to English.
    pub fn from_code(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "zh" => Self::Zh,
            "ko" => Self::Ko,
            _ => Self::En,
        }
    }

    /// Resolve the output language from an `Accept-Language` header value.
    ///
    /// Only the first language tag is considered, matched by prefix.
    pub fn resolve(accept_language: Option<&str>) -> Self {
        let Some(raw) = accept_language else {
            return Self::En;
        };
        let first = raw.split(',').next().unwrap_or("").trim().to_lowercase();
        if first.starts_with("zh") {
            Self::Zh
        } else if first.starts_with("ko") {
            Self::Ko
        } else {
            Self::En
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefix_match() {
        assert_eq!(OutputLanguage::resolve(Some("zh-CN,zh;q=0.9,en;q=0.8")), OutputLanguage::Zh);
        assert_eq!(OutputLanguage::resolve(Some("ko-KR")), OutputLanguage::Ko);
        assert_eq!(OutputLanguage::resolve(Some("en-US,en;q=0.5")), OutputLanguage::En);
    }

    #[test]
    fn test_resolve_defaults_to_english() {
        assert_eq!(OutputLanguage::resolve(None), OutputLanguage::En);
        assert_eq!(OutputLanguage::resolve(Some("")), OutputLanguage::En);
        assert_eq!(OutputLanguage::resolve(Some("fr-FR")), OutputLanguage::En);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(OutputLanguage::from_code("zh"), OutputLanguage::Zh);
        assert_eq!(OutputLanguage::from_code(" KO "), OutputLanguage::Ko);
        assert_eq!(OutputLanguage::from_code("xx"), OutputLanguage::En);
    }
}
