use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::image::ImageModel;
use crate::types::{GeneratedImage, ImageRequest, ProviderId};

pub(crate) const DEFAULT_BASE_URL: &str = "https://source.unsplash.com";
const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_secs(1);
const MAX_QUERY_CHARS: usize = 50;

/// Last-resort generator. Never fails: it resolves to a keyword-search image
/// URL built from the prompt, after a fixed delay that models a real network
/// round trip so callers see consistent loading behavior.
#[derive(Clone)]
pub struct Placeholder {
    base_url: String,
    simulated_delay: Duration,
}

impl Placeholder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            simulated_delay: DEFAULT_SIMULATED_DELAY,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_simulated_delay(mut self, delay: Duration) -> Self {
        self.simulated_delay = delay;
        self
    }
}

impl Default for Placeholder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageModel for Placeholder {
    fn provider(&self) -> ProviderId {
        ProviderId::Placeholder
    }

    async fn generate(&self, request: ImageRequest) -> Result<GeneratedImage> {
        tokio::time::sleep(self.simulated_delay).await;

        let query: String = request.prompt.chars().take(MAX_QUERY_CHARS).collect();
        let base = self.base_url.trim_end_matches('/');
        let url = format!("{base}/800x450/?{}", urlencoding::encode(&query));

        Ok(GeneratedImage::new(url, request.prompt))
    }
}
