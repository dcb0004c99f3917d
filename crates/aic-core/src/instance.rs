use std::{fmt::Debug, sync::Arc};

use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};
use thiserror::Error;
use url::Url;

use crate::{
    auth::{get_token, ClientConfig, TokenError},
    ConfigError, LibraryConfig,
};

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No auth strategy was provided when creating the AmInstance")]
    NoStrategy,
    #[error("There was a problem with the config to authenticate: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    InvalidHeader(#[from] InvalidHeaderValue),
}

/// Produces the headers that authenticate an outbound request.
#[async_trait::async_trait]
pub trait AuthStrategy: Debug + Send + Sync {
    /// Headers to attach to a request sent to `instance`.
    async fn auth_header(&self, instance: &AmInstance) -> Result<HeaderMap, AuthError>;
}

/// A tenant's access-management service, identified by its base URL.
#[derive(Clone, Debug)]
pub struct AmInstance {
    base_url: Url,
    http: reqwest::Client,
    auth_strategy: Option<Arc<dyn AuthStrategy>>,
}

impl AmInstance {
    #[allow(missing_docs)]
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            http: reqwest::Client::new(),
            auth_strategy: None,
        })
    }

    /// Authenticate IDM and other protected calls with `strategy`.
    pub fn with_auth_strategy(mut self, strategy: Arc<dyn AuthStrategy>) -> Self {
        self.auth_strategy = Some(strategy);
        self
    }

    /// Send requests through `http` instead of a default client.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    #[allow(missing_docs)]
    pub fn host(&self) -> Option<&str> {
        self.base_url.host_str()
    }

    #[allow(missing_docs)]
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL of `path` on this instance.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Headers produced by the configured auth strategy.
    pub async fn auth_header(&self) -> Result<HeaderMap, AuthError> {
        let strategy = self.auth_strategy.as_ref().ok_or(AuthError::NoStrategy)?;
        strategy.auth_header(self).await
    }
}

/// A realm within an [`AmInstance`].
#[derive(Clone, Debug)]
pub struct AmRealm {
    realm_name: String,
    am: AmInstance,
}

impl AmRealm {
    #[allow(missing_docs)]
    pub fn new(realm_name: impl Into<String>, am: AmInstance) -> Self {
        Self {
            realm_name: realm_name.into(),
            am,
        }
    }

    #[allow(missing_docs)]
    pub fn realm_name(&self) -> &str {
        &self.realm_name
    }

    #[allow(missing_docs)]
    pub fn am(&self) -> &AmInstance {
        &self.am
    }
}

/// Bearer credentials minted from the configured cloud service account.
///
/// Every call signs a new assertion and exchanges it, so tokens are never cached.
#[derive(Clone, Debug)]
pub struct ServiceAccountAuthStrategy {
    config: LibraryConfig,
}

impl ServiceAccountAuthStrategy {
    #[allow(missing_docs)]
    pub fn new(config: LibraryConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl AuthStrategy for ServiceAccountAuthStrategy {
    async fn auth_header(&self, instance: &AmInstance) -> Result<HeaderMap, AuthError> {
        let client_config = ClientConfig::from_library_config(&self.config)?;
        let token = get_token(instance.http_client(), instance.base_url(), &client_config).await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
        Ok(headers)
    }
}
