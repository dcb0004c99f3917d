//! Library configuration
//!
//! Settings are read from a JSON file named [`CONFIG_FILE_NAME`]. The file is looked up in the
//! current directory, then in every parent directory, and finally in the user's home directory.
//! Keys keep their upper-case spelling:
//!
//! ```json
//! {
//!   "BASE_URL": "https://openam-tenant.example.com",
//!   "REALM": "alpha",
//!   "SERVICE_ACCOUNT_ID": "c5d2...",
//!   "SERVICE_ACCOUNT_CLIENT_ID": "service-account",
//!   "SERVICE_ACCOUNT_SCOPE": "fr:idm:*",
//!   "SERVICE_ACCOUNT_JWK_PATH": "./service-account.jwk",
//!   "COOKIE_NAME": "6ac6499e9da2071",
//!   "GMAIL": "journey.tests@example.com",
//!   "GMAIL_APP_PASSWORD": "app-password",
//!   "DEBUG_LOGS": false
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed name of the settings file searched for by [`LibraryConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "ping-aic-lib-ts.config.json";

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} config file not found.")]
    NotFound(&'static str),
    #[error("Unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("The setting {0} is required but was not found in the config file")]
    MissingSetting(&'static str),
}

/// Settings shared by every journey, IDM helper and credential strategy.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LibraryConfig {
    pub base_url: Option<String>,
    pub realm: Option<String>,
    pub service_account_id: Option<String>,
    pub service_account_client_id: Option<String>,
    pub service_account_scope: Option<String>,
    pub service_account_jwk_path: Option<PathBuf>,
    pub cookie_name: Option<String>,
    pub gmail: Option<String>,
    pub gmail_app_password: Option<String>,
    #[serde(default)]
    pub debug_logs: bool,
}

impl LibraryConfig {
    /// Search for the settings file starting at the current working directory.
    pub fn discover() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Read {
            path: PathBuf::from("."),
            source,
        })?;
        Self::discover_from(&cwd)
    }

    /// Search for the settings file in `start`, its ancestors and finally the home directory.
    pub fn discover_from(start: &Path) -> Result<Self, ConfigError> {
        let path = start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .chain(home_dir().map(|home| home.join(CONFIG_FILE_NAME)))
            .find(|candidate| candidate.is_file())
            .ok_or(ConfigError::NotFound(CONFIG_FILE_NAME))?;

        tracing::debug!(path = %path.display(), "loading library config");
        Self::from_path(&path)
    }

    /// Load the settings from an explicit file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse the settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// `BASE_URL`, the tenant root every endpoint is resolved against.
    pub fn require_base_url(&self) -> Result<&str, ConfigError> {
        required(&self.base_url, "BASE_URL")
    }

    /// `REALM`, the default realm journeys run in.
    pub fn require_realm(&self) -> Result<&str, ConfigError> {
        required(&self.realm, "REALM")
    }

    /// `COOKIE_NAME`, the session cookie name of the tenant.
    pub fn require_cookie_name(&self) -> Result<&str, ConfigError> {
        required(&self.cookie_name, "COOKIE_NAME")
    }

    /// `SERVICE_ACCOUNT_JWK_PATH`, the service-account private key file.
    pub fn require_service_account_key_path(&self) -> Result<&Path, ConfigError> {
        self.service_account_jwk_path
            .as_deref()
            .ok_or(ConfigError::MissingSetting("SERVICE_ACCOUNT_JWK_PATH"))
    }

    /// `GMAIL` and `GMAIL_APP_PASSWORD`, the inbox used for emailed one-time codes.
    pub fn require_mail_credentials(&self) -> Result<(&str, &str), ConfigError> {
        Ok((
            required(&self.gmail, "GMAIL")?,
            required(&self.gmail_app_password, "GMAIL_APP_PASSWORD")?,
        ))
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingSetting(name))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
