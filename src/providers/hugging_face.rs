use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use crate::config::Config;
use crate::image::ImageModel;
use crate::providers::placeholder::Placeholder;
use crate::types::{GeneratedImage, ImageRequest, ProviderId};
use crate::utils::http;
use crate::{PictorError, Result};

pub(crate) const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Models to try, most accessible first.
const DEFAULT_MODELS: &[&str] = &[
    "CompVis/stable-diffusion-v1-4",
    "runwayml/stable-diffusion-v1-5",
    "stabilityai/stable-diffusion-2-1",
];

/// Best-effort free-tier adapter. Walks an ordered model list, trying each
/// unauthenticated first (some models serve public requests) and once more
/// with the configured token when the backend demands auth. A cold-starting
/// model (503) advances the walk rather than retrying the same endpoint.
/// When the whole list is exhausted the adapter resolves via the placeholder
/// generator, so it never surfaces a hard failure to its caller.
#[derive(Clone)]
pub struct HuggingFace {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    models: Vec<String>,
    placeholder: Placeholder,
}

impl HuggingFace {
    pub fn new(api_token: impl Into<String>) -> Self {
        let api_token = api_token.into();
        Self {
            http: http::default_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: Some(api_token).filter(|token| !token.trim().is_empty()),
            models: DEFAULT_MODELS.iter().map(|model| model.to_string()).collect(),
            placeholder: Placeholder::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.hugging_face_api_token.clone().unwrap_or_default())
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models(mut self, models: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    fn model_url(&self, model: &str) -> String {
        http::join_endpoint(&self.base_url, &format!("models/{model}"))
    }

    async fn try_model(&self, model: &str, prompt: &str) -> Result<GeneratedImage> {
        let body = json!({ "inputs": prompt });

        let response = self.http.post(self.model_url(model)).json(&body).send().await?;
        let status = response.status();

        let response = if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            let Some(api_token) = self.api_token.as_deref() else {
                return Err(PictorError::Auth {
                    provider: self.provider(),
                    message: format!("{model} rejected unauthenticated access ({status})"),
                });
            };
            tracing::debug!(model, "retrying with bearer token");
            let authed = self
                .http
                .post(self.model_url(model))
                .bearer_auth(api_token)
                .json(&body)
                .send()
                .await?;
            http::check_status(self.provider(), authed).await?
        } else {
            http::check_status(self.provider(), response).await?
        };

        let Some(media_type) = http::image_content_type(&response) else {
            return Err(PictorError::MalformedResponse(format!(
                "{model} returned non-image content type {:?}",
                http::declared_content_type(&response).unwrap_or_default()
            )));
        };

        let bytes = response.bytes().await?;
        tracing::debug!(model, bytes = bytes.len(), %media_type, "hugging face returned image body");
        Ok(GeneratedImage::new(http::data_url(&media_type, &bytes), prompt))
    }
}

#[async_trait]
impl ImageModel for HuggingFace {
    fn provider(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    async fn generate(&self, request: ImageRequest) -> Result<GeneratedImage> {
        for model in &self.models {
            match self.try_model(model, &request.prompt).await {
                Ok(image) => return Ok(image),
                Err(err) => {
                    tracing::warn!(model = model.as_str(), error = %err, "hugging face model attempt failed, advancing");
                }
            }
        }

        tracing::warn!("every hugging face model failed, resolving via placeholder");
        self.placeholder.generate(request).await
    }
}
