use std::{fmt::Debug, sync::Arc};

use aic_core::{json_or_error, AmInstance, ApiError, AuthError, DebugLog};
use reqwest::{header::HeaderMap, Method};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::IdmError;

/// Produces the headers that authenticate a request to IDM.
#[async_trait::async_trait]
pub trait IdmAuthStrategy: Debug + Send + Sync {
    #[allow(missing_docs)]
    async fn auth_header(&self) -> Result<HeaderMap, AuthError>;
}

/// Authenticates IDM calls with the credentials of an [`AmInstance`].
#[derive(Clone, Debug)]
pub struct CloudAmAuth {
    am: AmInstance,
}

impl CloudAmAuth {
    #[allow(missing_docs)]
    pub fn new(am: AmInstance) -> Self {
        Self { am }
    }
}

#[async_trait::async_trait]
impl IdmAuthStrategy for CloudAmAuth {
    async fn auth_header(&self) -> Result<HeaderMap, AuthError> {
        self.am.auth_header().await
    }
}

/// The IDM service of a tenant.
#[derive(Clone, Debug)]
pub struct IdmInstance {
    base_url: Url,
    http: reqwest::Client,
    auth_strategy: Arc<dyn IdmAuthStrategy>,
    debug_log: DebugLog,
}

impl IdmInstance {
    #[allow(missing_docs)]
    pub fn new(
        base_url: &str,
        auth_strategy: Arc<dyn IdmAuthStrategy>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            http: reqwest::Client::new(),
            auth_strategy,
            debug_log: DebugLog::disabled(),
        })
    }

    #[allow(missing_docs)]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    #[allow(missing_docs)]
    pub fn with_debug_log(mut self, debug_log: DebugLog) -> Self {
        self.debug_log = debug_log;
        self
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Send a JSON request to `endpoint`, a path starting with `/`.
    ///
    /// The strategy's headers are only requested and attached when `authenticate` is set.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        query: &[(&str, &str)],
        body: Option<&Value>,
        authenticate: bool,
    ) -> Result<Value, IdmError> {
        let url = format!("{}{}", self.base_url(), endpoint);
        debug!(%method, url, authenticate, "IDM request");

        let mut request = self.http.request(method, &url).query(query);
        if authenticate {
            request = request.headers(self.auth_strategy.auth_header().await?);
        }
        if let Some(body) = body {
            self.debug_log.log_value("IDM request body", body);
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::from)?;
        let value: Value = json_or_error(response).await?;
        self.debug_log.log_value("IDM response", &value);
        Ok(value)
    }
}
