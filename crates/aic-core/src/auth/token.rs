use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{sign_assertion, ClientConfig};
use crate::{json_or_error, ApiError};

/// Grant type of the assertion exchange.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Private key not defined")]
    MissingPrivateKey,
    #[error("The private key is not a valid JWK: {0}")]
    InvalidJwk(serde_json::Error),
    #[error("Unsupported JWK key type: {0}")]
    UnsupportedKeyType(String),
    #[error("Unable to encode the private key: {0}")]
    KeyEncoding(String),
    #[error(transparent)]
    Rsa(#[from] rsa::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Form(#[from] serde_urlencoded::ser::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("The token endpoint answered without an access_token")]
    MissingAccessToken,
}

#[derive(Serialize, Debug)]
struct AccessTokenRequest<'a> {
    grant_type: &'static str,
    client_id: Option<&'a str>,
    scope: Option<&'a str>,
    assertion: String,
}

#[derive(Deserialize, Debug)]
struct AccessTokenResponse {
    access_token: Option<String>,
}

/// `{base_url}/am/oauth2/access_token`, also the audience of the assertion.
pub fn access_token_endpoint(base_url: &str) -> String {
    format!("{}/am/oauth2/access_token", base_url.trim_end_matches('/'))
}

/// Exchange a freshly signed assertion for an access token.
pub async fn get_token(
    http: &reqwest::Client,
    base_url: &str,
    config: &ClientConfig,
) -> Result<String, TokenError> {
    let endpoint = access_token_endpoint(base_url);
    let payload = AccessTokenRequest {
        grant_type: JWT_BEARER_GRANT_TYPE,
        client_id: config.client_id.as_deref(),
        scope: config.scope.as_deref(),
        assertion: sign_assertion(config, &endpoint)?,
    };

    debug!(url = %endpoint, client_id = ?payload.client_id, "requesting access token");

    let response = http
        .post(&endpoint)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(ACCEPT, "application/json")
        // No nested structures in the payload, so `serde_urlencoded` is enough here.
        .body(serde_urlencoded::to_string(&payload)?)
        .send()
        .await
        .map_err(ApiError::from)?;

    let token: AccessTokenResponse = json_or_error(response).await?;
    token.access_token.ok_or(TokenError::MissingAccessToken)
}

#[cfg(test)]
mod tests {
    use aic_test::start_api_mock;
    use wiremock::{matchers, Mock, ResponseTemplate};

    use super::*;

    const PEM: &str = include_str!("../../tests/fixtures/service_account.pem");

    fn client_config() -> ClientConfig {
        ClientConfig {
            client_id: Some("service-account".to_owned()),
            jwt_issuer: Some("issuer".to_owned()),
            private_key: Some(PEM.to_owned()),
            scope: Some("fr:idm:*".to_owned()),
        }
    }

    #[test]
    fn builds_endpoint_without_double_slash() {
        assert_eq!(
            access_token_endpoint("https://tenant.example.com/"),
            "https://tenant.example.com/am/oauth2/access_token"
        );
    }

    #[tokio::test]
    async fn exchanges_assertion_for_access_token() {
        let mock = Mock::given(matchers::method("POST"))
            .and(matchers::path("/am/oauth2/access_token"))
            .and(matchers::header(
                CONTENT_TYPE.as_str(),
                "application/x-www-form-urlencoded",
            ))
            .and(matchers::body_string_contains(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
            ))
            .and(matchers::body_string_contains("client_id=service-account"))
            .and(matchers::body_string_contains("scope=fr%3Aidm%3A*"))
            .and(matchers::body_string_contains("assertion=ey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-123",
                "token_type": "Bearer",
                "expires_in": 899
            })));

        let server = start_api_mock(vec![mock]).await;

        let token = get_token(&reqwest::Client::new(), &server.uri(), &client_config())
            .await
            .unwrap();
        assert_eq!(token, "access-123");
    }

    #[tokio::test]
    async fn surfaces_rejections() {
        let mock = Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_client"
            })));

        let server = start_api_mock(vec![mock]).await;

        let err = get_token(&reqwest::Client::new(), &server.uri(), &client_config())
            .await
            .unwrap_err();

        match err {
            TokenError::Api(api) => {
                assert_eq!(api.status(), Some(reqwest::StatusCode::BAD_REQUEST));
                assert!(api.to_string().contains("invalid_client"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_access_token_is_reported() {
        let mock = Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})));

        let server = start_api_mock(vec![mock]).await;

        let err = get_token(&reqwest::Client::new(), &server.uri(), &client_config())
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::MissingAccessToken));
    }
}
