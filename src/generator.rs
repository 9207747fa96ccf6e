use crate::config::{Config, Env};
use crate::image::ImageModel;
use crate::providers::{HuggingFace, Placeholder, Replicate, Stability};
use crate::types::{GeneratedImage, ImageRequest, ProviderId};
use crate::{PictorError, Result};

/// Entry point for the presentation layer. Validates the prompt, builds the
/// credential-driven attempt chain once per call, and demotes to the next
/// adapter on recoverable failure. Stateless across calls.
pub struct ImageGenerator {
    stability: Stability,
    replicate: Replicate,
    hugging_face: HuggingFace,
    placeholder: Placeholder,
}

impl ImageGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            stability: Stability::from_config(config),
            replicate: Replicate::from_config(config),
            hugging_face: HuggingFace::from_config(config),
            placeholder: Placeholder::new(),
        }
    }

    pub fn from_env(env: &Env) -> Self {
        Self::new(&Config::from_env(env))
    }

    /// Shares one client across every HTTP-backed adapter.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.stability = self.stability.with_http_client(http.clone());
        self.replicate = self.replicate.with_http_client(http.clone());
        self.hugging_face = self.hugging_face.with_http_client(http);
        self
    }

    pub fn with_stability(mut self, stability: Stability) -> Self {
        self.stability = stability;
        self
    }

    pub fn with_replicate(mut self, replicate: Replicate) -> Self {
        self.replicate = replicate;
        self
    }

    pub fn with_hugging_face(mut self, hugging_face: HuggingFace) -> Self {
        self.hugging_face = hugging_face;
        self
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Generates an image for the prompt, selecting among the configured
    /// backends. Premium adapters are attempted in credential order; a
    /// recoverable failure demotes to the next adapter, a terminal failure
    /// surfaces immediately. The free-tier tail resolves one way or another,
    /// so a call that passes prompt validation only fails on a terminal
    /// premium-adapter failure.
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        let request = validated_request(prompt)?;

        for adapter in self.premium_chain() {
            tracing::debug!(provider = %adapter.provider(), "attempting image generation");
            match adapter.generate(request.clone()).await {
                Ok(image) => return Ok(image),
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(
                        provider = %adapter.provider(),
                        error = %err,
                        "provider failed, demoting to next in chain"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        self.hugging_face.generate(request).await
    }

    /// Explicit pin: invokes exactly this provider and propagates its
    /// failure without cross-provider fallback.
    pub async fn generate_on(&self, provider: ProviderId, prompt: &str) -> Result<GeneratedImage> {
        let request = validated_request(prompt)?;
        match provider {
            ProviderId::Stability => self.stability.generate(request).await,
            ProviderId::Replicate => self.replicate.generate(request).await,
            ProviderId::HuggingFace => self.hugging_face.generate(request).await,
            ProviderId::Placeholder => self.placeholder.generate(request).await,
        }
    }

    /// The provider an unpinned call will try first, given the configured
    /// credentials.
    pub fn selected_provider(&self) -> ProviderId {
        if self.stability.has_api_key() {
            ProviderId::Stability
        } else if self.replicate.has_api_token() {
            ProviderId::Replicate
        } else {
            ProviderId::HuggingFace
        }
    }

    /// Premium adapters with a configured credential, in precedence order.
    /// The free-tier adapter is always the tail and is not part of this
    /// list.
    fn premium_chain(&self) -> Vec<&dyn ImageModel> {
        let mut chain = Vec::<&dyn ImageModel>::new();
        if self.stability.has_api_key() {
            chain.push(&self.stability);
        }
        if self.replicate.has_api_token() {
            chain.push(&self.replicate);
        }
        chain
    }
}

fn validated_request(prompt: &str) -> Result<ImageRequest> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(PictorError::EmptyPrompt);
    }
    Ok(ImageRequest::new(trimmed))
}
