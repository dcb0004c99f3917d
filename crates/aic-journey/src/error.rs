use std::fmt;

use aic_core::ConfigError;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::{email::EmailError, totp::TotpError};

/// Errors that abort a journey run.
///
/// Transport and backend failures of a single turn are not part of this type: they are kept
/// as [`AuthenticateError`] in the journey's state so that error validations can inspect them.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum JourneyError {
    #[error(transparent)]
    Step(#[from] StepFailure),
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("No AM URL provided and no default URL found in the configuration")]
    NoAmUrl,
    #[error("No realm name provided and no default realm found in the configuration")]
    NoRealm,
    #[error("Invalid AM URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error(transparent)]
    Otp(#[from] TotpError),
}

/// Render the diagnostic block used for every step failure.
///
/// Absent parts are shown as `N/A`.
pub fn step_message(
    step: Option<&str>,
    stage: Option<&str>,
    action: Option<&str>,
    message: Option<&str>,
) -> String {
    format!(
        "\n  Step: {}.\n  Stage: {}\n  Action: {}\n  Message: {}",
        step.unwrap_or("N/A"),
        stage.unwrap_or("N/A"),
        action.unwrap_or("N/A"),
        message.unwrap_or("N/A"),
    )
}

/// A journey definition asked for something the current state cannot provide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepFailure {
    #[allow(missing_docs)]
    pub step: Option<String>,
    #[allow(missing_docs)]
    pub stage: Option<String>,
    #[allow(missing_docs)]
    pub action: Option<String>,
    #[allow(missing_docs)]
    pub message: String,
}

impl StepFailure {
    #[allow(missing_docs)]
    pub fn new(
        step: &str,
        stage: Option<&str>,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step: Some(step.to_owned()),
            stage: stage.map(str::to_owned),
            action: Some(action.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&step_message(
            self.step.as_deref(),
            self.stage.as_deref(),
            self.action.as_deref(),
            Some(self.message.as_str()),
        ))
    }
}

impl std::error::Error for StepFailure {}

/// A validation matcher rejected the journey state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{reason}\nExpected: {expected}\n     but: was {actual}")]
pub struct AssertionFailure {
    /// Names the step the assertion ran in.
    pub reason: String,
    /// Description of the failing matcher.
    pub expected: String,
    /// Debug rendering of the rejected value.
    pub actual: String,
}

/// Outcome of a turn that produced no [`AuthenticateResponse`](crate::AuthenticateResponse).
///
/// `status` is absent when the request never got an HTTP answer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuthenticateError {
    #[allow(missing_docs)]
    #[serde(serialize_with = "serialize_status")]
    pub status: Option<StatusCode>,
    #[allow(missing_docs)]
    pub message: String,
    /// Parsed JSON body of the error response, if it had one.
    pub body: Option<Value>,
}

fn serialize_status<S: serde::Serializer>(
    status: &Option<StatusCode>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    status.map(|s| s.as_u16()).serialize(serializer)
}

impl AuthenticateError {
    /// The platform answered with a non-success status.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        Self {
            status: Some(status),
            message: format!(
                "Response code {} ({})",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ),
            body: serde_json::from_str(body).ok(),
        }
    }

    /// The request failed before a response arrived.
    pub fn transport(error: &reqwest::Error) -> Self {
        Self {
            status: error.status(),
            message: error.to_string(),
            body: None,
        }
    }

    /// A success response whose body was not an authenticate response.
    pub fn decode(status: StatusCode, error: &serde_json::Error) -> Self {
        Self {
            status: Some(status),
            message: error.to_string(),
            body: None,
        }
    }
}

impl fmt::Display for AuthenticateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
