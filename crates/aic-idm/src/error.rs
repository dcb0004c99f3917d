use aic_core::{ApiError, AuthError, ConfigError};
use aic_journey::JourneyError;
use reqwest::header::InvalidHeaderValue;
use thiserror::Error;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum IdmError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),
    #[error(transparent)]
    InvalidHeader(#[from] InvalidHeaderValue),
    #[error(transparent)]
    Journey(#[from] JourneyError),

    #[error("The journey ended without a session token")]
    MissingSessionToken,
}
