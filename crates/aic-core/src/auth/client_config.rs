use crate::{ConfigError, LibraryConfig};

/// Service-account identity used to mint bearer assertions.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub client_id: Option<String>,
    pub jwt_issuer: Option<String>,
    pub private_key: Option<String>,
    pub scope: Option<String>,
}

impl ClientConfig {
    /// Build the client config from the `SERVICE_ACCOUNT_*` settings, reading the key file
    /// referenced by `SERVICE_ACCOUNT_JWK_PATH`.
    pub fn from_library_config(config: &LibraryConfig) -> Result<Self, ConfigError> {
        let path = config.require_service_account_key_path()?;
        let private_key = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            client_id: config.service_account_client_id.clone(),
            jwt_issuer: config.service_account_id.clone(),
            private_key: Some(private_key),
            scope: config.service_account_scope.clone(),
        })
    }
}
