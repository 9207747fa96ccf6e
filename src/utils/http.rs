use std::time::Duration;

use base64::Engine as _;
use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::types::ProviderId;
use crate::{PictorError, Result};

const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

pub(crate) fn join_endpoint(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}

/// Maps a non-success status onto the failure taxonomy. 5xx is the
/// cold-start/unavailable family; statuses outside the documented contract
/// count as a malformed response.
pub(crate) fn classify_status(provider: ProviderId, status: StatusCode, body: String) -> PictorError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PictorError::Auth {
            provider,
            message: format!("{status}: {body}"),
        },
        StatusCode::TOO_MANY_REQUESTS => PictorError::RateLimited { provider },
        status if status.is_server_error() => PictorError::ModelUnavailable {
            provider,
            message: format!("{status}: {body}"),
        },
        status => PictorError::MalformedResponse(format!(
            "{provider} returned unexpected status {status}: {body}"
        )),
    }
}

pub(crate) async fn send_checked(
    provider: ProviderId,
    req: reqwest::RequestBuilder,
) -> Result<reqwest::Response> {
    check_status(provider, req.send().await?).await
}

pub(crate) async fn check_status(
    provider: ProviderId,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response_text_truncated(response, MAX_ERROR_BODY_BYTES).await;
        return Err(classify_status(provider, status, body));
    }
    Ok(response)
}

pub(crate) async fn send_checked_json<T: DeserializeOwned>(
    provider: ProviderId,
    req: reqwest::RequestBuilder,
) -> Result<T> {
    let response = send_checked(provider, req).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice::<T>(&bytes)?)
}

/// Content type of a successful response, if it declares an image body.
pub(crate) fn image_content_type(response: &reqwest::Response) -> Option<String> {
    declared_content_type(response).filter(|ct| ct.starts_with("image/"))
}

pub(crate) fn declared_content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_ascii_lowercase())
}

/// Materializes image bytes as a self-contained `data:` URL, the library's
/// stand-in for the browser-side object URLs the callers would otherwise
/// build.
pub(crate) fn data_url(media_type: &str, bytes: &[u8]) -> String {
    let data = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{media_type};base64,{data}")
}

pub(crate) async fn response_text_truncated(
    response: reqwest::Response,
    max_bytes: usize,
) -> String {
    let (bytes, truncated) = response_bytes_truncated(response, max_bytes).await;
    let mut body = String::from_utf8_lossy(&bytes).to_string();
    if truncated {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str("...(truncated)");
    }
    body
}

async fn response_bytes_truncated(
    response: reqwest::Response,
    max_bytes: usize,
) -> (Vec<u8>, bool) {
    let max_bytes = max_bytes.max(1);
    let mut out = Vec::<u8>::new();
    let mut truncated = false;

    let mut stream = response.bytes_stream();
    while let Some(next) = stream.next().await {
        let Ok(chunk) = next else {
            break;
        };
        let remaining = max_bytes.saturating_sub(out.len());
        if remaining == 0 {
            truncated = true;
            break;
        }
        if chunk.len() <= remaining {
            out.extend_from_slice(chunk.as_ref());
        } else {
            out.extend_from_slice(&chunk.as_ref()[..remaining]);
            truncated = true;
            break;
        }
    }
    (out, truncated)
}
