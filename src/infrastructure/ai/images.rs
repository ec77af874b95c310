//! Image loading for multimodal preview requests.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::time::Duration;

/// A downloaded image ready for embedding in a provider request.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub base64: String,
    pub mime_type: String,
}

impl ImageAttachment {
    /// Render as an RFC 2397 data URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Downloads and encodes reference images.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    pub fn new(connect_timeout_ms: u64, read_timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(connect_timeout_ms.max(1000)))
            .timeout(Duration::from_millis(read_timeout_ms.max(1000)))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Fetch an image and encode it as base64 with a best-effort mime type.
    pub async fn fetch(&self, url: &str) -> Result<ImageAttachment, String> {
        if url.trim().is_empty() {
            return Err("image URL is missing".to_string());
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("unable to load image: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("unable to load image: HTTP {}", response.status()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let mime_type = normalize_mime_type(content_type.as_deref(), url);

        let bytes = response.bytes().await.map_err(|e| format!("unable to load image: {e}"))?;
        if bytes.is_empty() {
            return Err("empty image content".to_string());
        }

        Ok(ImageAttachment { base64: BASE64.encode(&bytes), mime_type })
    }
}

/// Pick a mime type from the content-type header, falling back to the URL
/// extension and finally to JPEG.
fn normalize_mime_type(content_type: Option<&str>, url: &str) -> String {
    if let Some(raw) = content_type {
        let lower = raw.trim().to_lowercase();
        if lower.starts_with("image/") {
            return lower.split(';').next().unwrap_or(&lower).to_string();
        }
    }

    let lower_url = url.to_lowercase();
    if lower_url.ends_with(".png") {
        "image/png".to_string()
    } else if lower_url.ends_with(".webp") {
        "image/webp".to_string()
    } else if lower_url.ends_with(".gif") {
        "image/gif".to_string()
    } else {
        "image/jpeg".to_string()
    }
}
