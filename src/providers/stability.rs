use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::image::ImageModel;
use crate::types::{GeneratedImage, ImageRequest, ProviderId};
use crate::utils::http;
use crate::{PictorError, Result};

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.stability.ai";
const DEFAULT_ASPECT_RATIO: &str = "16:9";
const DEFAULT_OUTPUT_FORMAT: &str = "png";

/// Synchronous-blob adapter: one POST, an immediate binary image body in the
/// response. The bytes are returned as a `data:` URL.
#[derive(Clone)]
pub struct Stability {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    aspect_ratio: String,
    output_format: String,
}

impl Stability {
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        Self {
            http: http::default_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: Some(api_key).filter(|key| !key.trim().is_empty()),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.stability_api_key.clone().unwrap_or_default())
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    pub fn with_output_format(mut self, output_format: impl Into<String>) -> Self {
        self.output_format = output_format.into();
        self
    }

    pub(crate) fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn generate_url(&self) -> String {
        http::join_endpoint(&self.base_url, "v2beta/stable-image/generate/core")
    }
}

#[async_trait]
impl ImageModel for Stability {
    fn provider(&self) -> ProviderId {
        ProviderId::Stability
    }

    async fn generate(&self, request: ImageRequest) -> Result<GeneratedImage> {
        // Checked before the call so a missing key never costs a round trip.
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(PictorError::Auth {
                provider: self.provider(),
                message: "no api key configured".to_string(),
            });
        };

        let body = json!({
            "prompt": request.prompt,
            "aspect_ratio": self.aspect_ratio,
            "output_format": self.output_format,
        });

        let response = http::send_checked(
            self.provider(),
            self.http
                .post(self.generate_url())
                .bearer_auth(api_key)
                .header(reqwest::header::ACCEPT, "image/*")
                .json(&body),
        )
        .await?;

        let Some(media_type) = http::image_content_type(&response) else {
            return Err(PictorError::MalformedResponse(format!(
                "stability returned non-image content type {:?}",
                http::declared_content_type(&response).unwrap_or_default()
            )));
        };

        let bytes = response.bytes().await?;
        tracing::debug!(bytes = bytes.len(), %media_type, "stability returned image body");

        Ok(GeneratedImage::new(
            http::data_url(&media_type, &bytes),
            request.prompt,
        ))
    }
}
