use thiserror::Error;

use crate::types::ProviderId;

#[derive(Debug, Error)]
pub enum PictorError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("auth failed for {provider}: {message}")]
    Auth {
        provider: ProviderId,
        message: String,
    },
    #[error("rate limited by {provider}")]
    RateLimited { provider: ProviderId },
    #[error("model unavailable on {provider}: {message}")]
    ModelUnavailable {
        provider: ProviderId,
        message: String,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl PictorError {
    /// True for credential problems the caller should surface as
    /// "check your API key" rather than a generic failure message.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Failure classes the fallback chain demotes on. Transport and
    /// malformed-response failures are terminal for the selected adapter.
    pub(crate) fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Auth { .. } | Self::RateLimited { .. } | Self::ModelUnavailable { .. }
        )
    }
}

impl From<reqwest::Error> for PictorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for PictorError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(format!("failed to parse json: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PictorError>;
