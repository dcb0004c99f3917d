//! Helpers for tests that need a real user and an authenticated session.

use std::sync::Arc;

use aic_core::{AmInstance, AmRealm, DebugLog, LibraryConfig, ServiceAccountAuthStrategy};
use aic_journey::{process_journey_steps, Journey, JourneyError, JourneyStep};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use tracing::{debug, warn};

use crate::{CloudAmAuth, IdmError, IdmInstance, ManagedObject, User};

/// Forces re-authentication even when the session cookie is valid.
pub const FORCE_AUTH_HEADER: &str = "forceauth";

/// Users of one realm together with the realm they log in to.
#[derive(Clone, Debug)]
pub struct ManagedUsers {
    #[allow(missing_docs)]
    pub users: ManagedObject<User>,
    #[allow(missing_docs)]
    pub realm: AmRealm,
}

/// Run `steps`, advance once more and return the session token, if the journey issued one.
pub async fn create_user_session(
    journey: &mut Journey,
    steps: &[JourneyStep],
) -> Result<Option<String>, JourneyError> {
    process_journey_steps(journey, steps).await?;

    let token_id = journey
        .next_step()
        .await
        .and_then(|response| response.token_id.clone());
    debug!(journey = journey.name(), has_session = token_id.is_some(), "user session");
    Ok(token_id)
}

/// Delete a user, ignoring failures so cleanup never fails a test.
pub async fn delete_user(users: &ManagedObject<User>, id: &str) {
    if let Err(error) = users.delete(id).await {
        warn!(%error, id, "unable to delete user");
    }
}

/// Managed users of `realm_name`, authenticated with the configured service account.
///
/// `am_url` falls back to `BASE_URL`.
pub fn create_managed_users_instance(
    am_url: Option<&str>,
    realm_name: &str,
    config: &LibraryConfig,
) -> Result<ManagedUsers, IdmError> {
    let base_url = match am_url {
        Some(url) => url,
        None => config.require_base_url()?,
    };

    let am = AmInstance::new(base_url)?.with_auth_strategy(Arc::new(
        ServiceAccountAuthStrategy::new(config.clone()),
    ));
    let idm = IdmInstance::new(base_url, Arc::new(CloudAmAuth::new(am.clone())))?
        .with_http_client(am.http_client().clone())
        .with_debug_log(DebugLog::from_config(config));

    Ok(ManagedUsers {
        users: ManagedObject::new(idm, format!("{realm_name}_user")),
        realm: AmRealm::new(realm_name, am),
    })
}

/// Log in through `journey_name` and return headers that reuse the new session.
///
/// The session cookie is named after `COOKIE_NAME`.
pub async fn generate_user_session_headers(
    journey_name: &str,
    realm: AmRealm,
    steps: &[JourneyStep],
    config: &LibraryConfig,
) -> Result<HeaderMap, IdmError> {
    let cookie_name = config.require_cookie_name()?;

    let mut journey =
        Journey::new(journey_name, realm).with_debug_log(DebugLog::from_config(config));
    let token_id = create_user_session(&mut journey, steps)
        .await?
        .ok_or(IdmError::MissingSessionToken)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(FORCE_AUTH_HEADER),
        HeaderValue::from_static("true"),
    );
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!("{cookie_name}={token_id}"))?,
    );
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use aic_test::{fixtures, start_api_mock};
    use wiremock::{matchers, Mock, ResponseTemplate};

    use super::*;

    #[test]
    fn managed_users_follow_realm_name() {
        let config = LibraryConfig {
            base_url: Some("https://tenant.example.com".to_owned()),
            ..Default::default()
        };

        let managed = create_managed_users_instance(None, "bravo", &config).unwrap();
        assert_eq!(managed.users.object_type(), "bravo_user");
        assert_eq!(managed.realm.realm_name(), "bravo");
        assert_eq!(managed.realm.am().base_url(), "https://tenant.example.com");

        let managed = create_managed_users_instance(
            Some("https://other.example.com"),
            "alpha",
            &config,
        )
        .unwrap();
        assert_eq!(managed.realm.am().base_url(), "https://other.example.com");
    }

    #[test]
    fn managed_users_require_a_url() {
        let err = create_managed_users_instance(None, "alpha", &LibraryConfig::default())
            .unwrap_err();
        assert!(matches!(err, IdmError::Config(_)));
    }

    #[tokio::test]
    async fn session_headers_carry_token_cookie() {
        let server = start_api_mock(vec![Mock::given(matchers::method("POST"))
            .and(matchers::path("/am/json/authenticate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(fixtures::success_response("tok-1")),
            )])
        .await;

        let config = LibraryConfig {
            cookie_name: Some("iPlanetDirectoryPro".to_owned()),
            ..Default::default()
        };
        let realm = AmRealm::new("alpha", AmInstance::new(&server.uri()).unwrap());

        let headers = generate_user_session_headers("Login", realm, &[], &config)
            .await
            .unwrap();
        assert_eq!(headers[FORCE_AUTH_HEADER], "true");
        assert_eq!(headers[COOKIE], "iPlanetDirectoryPro=tok-1");
    }

    #[tokio::test]
    async fn session_headers_fail_without_token() {
        let server = start_api_mock(vec![Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "code": 401,
                "message": "Login failure"
            })))])
        .await;

        let config = LibraryConfig {
            cookie_name: Some("session".to_owned()),
            ..Default::default()
        };
        let realm = AmRealm::new("alpha", AmInstance::new(&server.uri()).unwrap());

        let err = generate_user_session_headers("Login", realm, &[], &config)
            .await
            .unwrap_err();
        assert!(matches!(err, IdmError::MissingSessionToken));
    }
}
