//! Errors that can occur when talking to the identity platform

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from performing network requests.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error("Received error message from server: [{}] {}", .status, .message)]
    ResponseContent { status: StatusCode, message: String },
}

impl ApiError {
    /// The HTTP status the server answered with, if the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::ResponseContent { status, .. } => Some(*status),
            Self::Reqwest(e) => e.status(),
            _ => None,
        }
    }
}

/// Deserializes a successful response body, or turns a non-2xx response into
/// [`ApiError::ResponseContent`] carrying the raw body text.
pub async fn json_or_error<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        let body = response.text().await?;
        return Ok(serde_json::from_str(&body)?);
    }

    let message = response.text().await.unwrap_or_default();
    Err(ApiError::ResponseContent { status, message })
}
