use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::image::ImageModel;
use crate::types::{GeneratedImage, ImageRequest, ProviderId};
use crate::utils::http;
use crate::{PictorError, Result};

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.replicate.com";
const DEFAULT_MODEL_VERSION: &str =
    "db21e45d3f7023abc2a46ee38a23973f6dce16bb082a930b0c49861f96d1e5bf";
const DEFAULT_ASPECT_RATIO: &str = "16:9";
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(120);

/// Polling-job adapter: one POST enqueues a prediction, then the job is
/// re-fetched at a fixed interval until it reaches a terminal status. The
/// backend itself polls forever; this adapter bounds the loop with a
/// wall-clock deadline.
#[derive(Clone)]
pub struct Replicate {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    model_version: String,
    aspect_ratio: String,
    poll_deadline: Duration,
}

impl Replicate {
    pub fn new(api_token: impl Into<String>) -> Self {
        let api_token = api_token.into();
        Self {
            http: http::default_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: Some(api_token).filter(|token| !token.trim().is_empty()),
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            poll_deadline: DEFAULT_POLL_DEADLINE,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.replicate_api_token.clone().unwrap_or_default())
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model_version(mut self, model_version: impl Into<String>) -> Self {
        self.model_version = model_version.into();
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    pub fn with_poll_deadline(mut self, deadline: Duration) -> Self {
        self.poll_deadline = deadline;
        self
    }

    pub(crate) fn has_api_token(&self) -> bool {
        self.api_token.is_some()
    }

    fn predictions_url(&self) -> String {
        http::join_endpoint(&self.base_url, "v1/predictions")
    }

    fn prediction_url(&self, id: &str) -> String {
        http::join_endpoint(&self.base_url, &format!("v1/predictions/{id}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    fn is_pending(self) -> bool {
        matches!(self, Self::Starting | Self::Processing)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    /// Null until the prediction produces artifacts.
    #[serde(default)]
    output: Option<Vec<String>>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl ImageModel for Replicate {
    fn provider(&self) -> ProviderId {
        ProviderId::Replicate
    }

    async fn generate(&self, request: ImageRequest) -> Result<GeneratedImage> {
        // Checked before the call so a missing token never costs a round trip.
        let Some(api_token) = self.api_token.as_deref() else {
            return Err(PictorError::Auth {
                provider: self.provider(),
                message: "no api token configured".to_string(),
            });
        };

        let body = json!({
            "version": self.model_version,
            "input": {
                "prompt": request.prompt,
                "num_outputs": 1,
                "aspect_ratio": self.aspect_ratio,
                "output_format": "url",
            },
        });

        let mut prediction: Prediction = http::send_checked_json(
            self.provider(),
            self.http
                .post(self.predictions_url())
                .header(reqwest::header::AUTHORIZATION, format!("Token {api_token}"))
                .json(&body),
        )
        .await?;
        tracing::debug!(id = %prediction.id, status = prediction.status.as_str(), "replicate prediction created");

        let deadline = tokio::time::Instant::now() + self.poll_deadline;
        while prediction.status.is_pending() {
            if tokio::time::Instant::now() >= deadline {
                return Err(PictorError::Transport(format!(
                    "replicate prediction {} still {} after {:?}",
                    prediction.id,
                    prediction.status.as_str(),
                    self.poll_deadline
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;

            prediction = http::send_checked_json(
                self.provider(),
                self.http
                    .get(self.prediction_url(&prediction.id))
                    .header(reqwest::header::AUTHORIZATION, format!("Token {api_token}")),
            )
            .await?;
            tracing::debug!(id = %prediction.id, status = prediction.status.as_str(), "replicate prediction polled");
        }

        match prediction.status {
            PredictionStatus::Succeeded => {
                let Some(url) = prediction
                    .output
                    .unwrap_or_default()
                    .into_iter()
                    .find(|url| !url.trim().is_empty())
                else {
                    return Err(PictorError::MalformedResponse(format!(
                        "replicate prediction {} succeeded without an output url",
                        prediction.id
                    )));
                };
                Ok(GeneratedImage::new(url, request.prompt))
            }
            status => Err(PictorError::ModelUnavailable {
                provider: self.provider(),
                message: prediction
                    .error
                    .unwrap_or_else(|| format!("prediction ended with status {}", status.as_str())),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };
    use serde_json::json;

    fn prediction_body(id: &str, status: &str, output: serde_json::Value) -> String {
        json!({ "id": id, "status": status, "output": output }).to_string()
    }

    #[tokio::test]
    async fn polls_until_succeeded_and_returns_first_output_url() -> Result<()> {
        if crate::utils::test_support::should_skip_httpmock() {
            return Ok(());
        }

        let server = MockServer::start_async().await;
        let create_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/predictions")
                    .header("authorization", "Token r8-tok")
                    .body_includes("\"version\":\"db21e45d3f7023abc2a46ee38a23973f6dce16bb082a930b0c49861f96d1e5bf\"")
                    .body_includes("\"prompt\":\"a red barn\"")
                    .body_includes("\"num_outputs\":1");
                then.status(201)
                    .header("content-type", "application/json")
                    .body(prediction_body("pred-1", "starting", json!(null)));
            })
            .await;
        let poll_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/predictions/pred-1")
                    .header("authorization", "Token r8-tok");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(prediction_body(
                        "pred-1",
                        "succeeded",
                        json!(["https://replicate.delivery/out-0.png"]),
                    ));
            })
            .await;

        let client = Replicate::new("r8-tok").with_base_url(server.base_url());
        let image = client.generate(ImageRequest::new("a red barn")).await?;

        create_mock.assert_async().await;
        poll_mock.assert_async().await;
        assert_eq!(image.image_url, "https://replicate.delivery/out-0.png");
        assert_eq!(image.prompt, "a red barn");
        Ok(())
    }

    #[tokio::test]
    async fn failed_prediction_is_model_unavailable() {
        if crate::utils::test_support::should_skip_httpmock() {
            return;
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/predictions");
                then.status(201)
                    .header("content-type", "application/json")
                    .body(json!({ "id": "pred-2", "status": "failed", "error": "NSFW content detected" }).to_string());
            })
            .await;

        let client = Replicate::new("r8-tok").with_base_url(server.base_url());
        let err = client
            .generate(ImageRequest::new("a red barn"))
            .await
            .expect_err("failed prediction must fail");
        assert!(matches!(err, PictorError::ModelUnavailable { .. }));
        assert!(err.to_string().contains("NSFW content detected"));
    }

    #[tokio::test]
    async fn succeeded_without_output_is_malformed() {
        if crate::utils::test_support::should_skip_httpmock() {
            return;
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/predictions");
                then.status(201)
                    .header("content-type", "application/json")
                    .body(prediction_body("pred-3", "succeeded", json!([])));
            })
            .await;

        let client = Replicate::new("r8-tok").with_base_url(server.base_url());
        let err = client
            .generate(ImageRequest::new("a red barn"))
            .await
            .expect_err("empty output must fail");
        assert!(matches!(err, PictorError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn pending_past_the_deadline_is_a_transport_failure() {
        if crate::utils::test_support::should_skip_httpmock() {
            return;
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/predictions");
                then.status(201)
                    .header("content-type", "application/json")
                    .body(prediction_body("pred-4", "processing", json!(null)));
            })
            .await;

        let client = Replicate::new("r8-tok")
            .with_base_url(server.base_url())
            .with_poll_deadline(Duration::ZERO);
        let err = client
            .generate(ImageRequest::new("a red barn"))
            .await
            .expect_err("deadline expiry must fail");
        assert!(matches!(err, PictorError::Transport(_)));
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_request() {
        let client = Replicate::new(" ").with_base_url("http://127.0.0.1:9/unroutable");
        let err = client
            .generate(ImageRequest::new("a red barn"))
            .await
            .expect_err("missing token must fail");
        assert!(err.is_auth());
    }
}
