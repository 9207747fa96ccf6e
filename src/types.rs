use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// The backends a generation can be served by. Computed fresh per call from
/// the configured credentials, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Stability,
    Replicate,
    HuggingFace,
    Placeholder,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stability => "stability",
            Self::Replicate => "replicate",
            Self::HuggingFace => "hugging_face",
            Self::Placeholder => "placeholder",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generation submission. Immutable; discarded once the call resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl From<String> for ImageRequest {
    fn from(prompt: String) -> Self {
        Self::new(prompt)
    }
}

impl From<&str> for ImageRequest {
    fn from(prompt: &str) -> Self {
        Self::new(prompt)
    }
}

/// A displayable generation result.
///
/// `image_url` is either a remote URL (a polling provider's output artifact,
/// the placeholder keyword URL) or a self-contained `data:` URL built from
/// returned image bytes. Either way it is renderable at return time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image_url: String,
    /// Echo of the trimmed input prompt.
    pub prompt: String,
    /// Creation instant, epoch milliseconds.
    pub timestamp: u64,
}

impl GeneratedImage {
    pub(crate) fn new(image_url: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            prompt: prompt.into(),
            timestamp: now_millis(),
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
