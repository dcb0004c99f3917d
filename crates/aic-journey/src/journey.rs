use std::sync::Arc;

use aic_core::{AmRealm, DebugLog};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    email::{check_email, CheckEmailParams, EmailError, Inbox},
    error::{AssertionFailure, AuthenticateError, JourneyError, StepFailure},
    AuthenticateResponse, Callback, CallbackType, Matcher,
};

const AUTHENTICATE_PATH: &str = "am/json/authenticate";
const OTP_AUTH_URI_MARKER: &str = "otpauth://";

/// Marks requests issued by the test driver.
pub const JOURNEY_TEST_HEADER: &str = "is-journey-test";
/// Identifies this library to the platform.
pub const CLIENT_NAME: &str = "ping-aic-library-rs";
/// Version pair of the `/authenticate` protocol spoken by the driver.
pub const ACCEPT_API_VERSION: &str = "protocol=1.0,resource=2.1";

/// Query keys owned by the driver. Caller values for these are replaced.
const RESERVED_QUERY_KEYS: [&str; 3] = ["realm", "authIndexType", "authIndexValue"];

/// A single cookie sent with every turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieParam {
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    pub value: String,
}

impl CookieParam {
    #[allow(missing_docs)]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// `name=value`, as sent in the `Cookie` header.
    pub fn to_cookie_header(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Running state of one authentication journey.
///
/// After every [`Journey::next_step`] exactly one of [`Journey::last_response`] and
/// [`Journey::auth_error`] is set. The callbacks of the last response are the ones actions
/// fill in and the ones submitted on the next turn.
#[derive(Debug)]
pub struct Journey {
    name: String,
    realm: AmRealm,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    cookie: Option<CookieParam>,
    debug_log: DebugLog,
    inbox: Option<Arc<dyn Inbox>>,

    last_response: Option<AuthenticateResponse>,
    auth_error: Option<AuthenticateError>,
    otp: Option<String>,
    otp_auth_uri: Option<String>,
}

impl Journey {
    /// A journey named `name`, run in `realm`.
    pub fn new(name: impl Into<String>, realm: AmRealm) -> Self {
        Self {
            name: name.into(),
            realm,
            headers: HeaderMap::new(),
            query_params: Vec::new(),
            cookie: None,
            debug_log: DebugLog::disabled(),
            inbox: None,
            last_response: None,
            auth_error: None,
            otp: None,
            otp_auth_uri: None,
        }
    }

    /// Extra headers sent with every turn. The driver's own headers take precedence.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Extra query parameters sent with every turn.
    pub fn with_query_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    #[allow(missing_docs)]
    pub fn with_cookie(mut self, cookie: CookieParam) -> Self {
        self.cookie = Some(cookie);
        self
    }

    #[allow(missing_docs)]
    pub fn with_debug_log(mut self, debug_log: DebugLog) -> Self {
        self.debug_log = debug_log;
        self
    }

    /// Mailbox used by [`Journey::check_email`].
    pub fn with_inbox(mut self, inbox: Arc<dyn Inbox>) -> Self {
        self.inbox = Some(inbox);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_last_response(mut self, response: AuthenticateResponse) -> Self {
        self.last_response = Some(response);
        self
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(missing_docs)]
    pub fn realm(&self) -> &AmRealm {
        &self.realm
    }

    #[allow(missing_docs)]
    pub fn last_response(&self) -> Option<&AuthenticateResponse> {
        self.last_response.as_ref()
    }

    #[allow(missing_docs)]
    pub fn auth_error(&self) -> Option<&AuthenticateError> {
        self.auth_error.as_ref()
    }

    /// Callbacks that will be submitted on the next turn.
    pub fn cur_callbacks(&self) -> Option<&[Callback]> {
        self.last_response.as_ref().map(|r| r.callbacks.as_slice())
    }

    #[allow(missing_docs)]
    pub fn otp(&self) -> Option<&str> {
        self.otp.as_deref()
    }

    #[allow(missing_docs)]
    pub fn set_otp(&mut self, otp: impl Into<String>) {
        self.otp = Some(otp.into());
    }

    #[allow(missing_docs)]
    pub fn otp_auth_uri(&self) -> Option<&str> {
        self.otp_auth_uri.as_deref()
    }

    #[allow(missing_docs)]
    pub fn set_otp_auth_uri(&mut self, uri: impl Into<String>) {
        self.otp_auth_uri = Some(uri.into());
    }

    /// Submit the current state and advance one turn.
    ///
    /// The first turn posts an empty object; later turns echo the last response with its
    /// (possibly filled in) callbacks. A failed turn is recorded in [`Journey::auth_error`] and
    /// `None` is returned; it is never retried.
    pub async fn next_step(&mut self) -> Option<&AuthenticateResponse> {
        match self.post_authenticate().await {
            Ok(response) => {
                self.auth_error = None;
                self.last_response = Some(response);
            }
            Err(error) => {
                self.last_response = None;
                self.auth_error = Some(error);
            }
        }
        self.last_response.as_ref()
    }

    async fn post_authenticate(&self) -> Result<AuthenticateResponse, AuthenticateError> {
        let am = self.realm.am();
        let url = am.endpoint(AUTHENTICATE_PATH);
        let query = self.query();

        debug!(journey = %self.name, realm = self.realm.realm_name(), %url, "POST /authenticate");
        self.debug_log.log_value("Post /authenticate request:", &self.last_response);

        let request = am
            .http_client()
            .post(&url)
            .query(&query)
            .headers(self.request_headers());
        let request = match &self.last_response {
            Some(last) => request.json(last),
            None => request.json(&Map::new()),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AuthenticateError::transport(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthenticateError::transport(&e))?;

        if !status.is_success() {
            let error = AuthenticateError::from_status(status, &body);
            debug!(journey = %self.name, %status, "authenticate rejected");
            self.debug_log.log_value("Error in postAuthenticate:", &error);
            return Err(error);
        }

        let response: AuthenticateResponse =
            serde_json::from_str(&body).map_err(|e| AuthenticateError::decode(status, &e))?;
        self.debug_log.log_value("Post /authenticate response:", &response);
        Ok(response)
    }

    fn query(&self) -> Vec<(&str, &str)> {
        let mut query: Vec<(&str, &str)> = self
            .query_params
            .iter()
            .filter(|(k, _)| !RESERVED_QUERY_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        query.extend([
            ("realm", self.realm.realm_name()),
            ("authIndexType", "service"),
            ("authIndexValue", self.name.as_str()),
        ]);
        query
    }

    fn request_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();

        headers.insert(
            HeaderName::from_static(JOURNEY_TEST_HEADER),
            HeaderValue::from_static("true"),
        );
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static(CLIENT_NAME),
        );
        headers.insert(
            HeaderName::from_static("accept-api-version"),
            HeaderValue::from_static(ACCEPT_API_VERSION),
        );
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));

        if let Some(cookie) = &self.cookie {
            let existing = headers.get(COOKIE).and_then(|v| v.to_str().ok());
            let merged = match existing {
                Some(existing) if !existing.is_empty() => {
                    format!("{existing}; {}", cookie.to_cookie_header())
                }
                _ => cookie.to_cookie_header(),
            };
            match HeaderValue::from_str(&merged) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(e) => tracing::warn!(cookie = %cookie.name, "Invalid cookie value: {e}"),
            }
        }

        headers
    }

    /// Overwrite the first input slot of the first callback of `callback_type` with `value`.
    pub fn set_value(
        &mut self,
        callback_type: &CallbackType,
        value: &str,
        step: &str,
        stage: Option<&str>,
    ) -> Result<(), StepFailure> {
        let action = format!("set {callback_type} to {value}");

        let callbacks = match self.last_response.as_mut() {
            Some(response) => &mut response.callbacks,
            None => return Err(StepFailure::new(step, stage, action, "Callbacks are undefined")),
        };

        let slot = callbacks
            .iter_mut()
            .find(|c| c.callback_type == *callback_type)
            .and_then(|c| c.input.as_mut())
            .and_then(|input| input.first_mut());

        match slot {
            Some(slot) => {
                debug!(step, %callback_type, "setting callback value");
                self.debug_log
                    .log(&format!("Setting {callback_type} value: {value} for {step}"));
                slot.value = Value::String(value.to_owned());
                Ok(())
            }
            None => Err(StepFailure::new(
                step,
                stage,
                action,
                "There was a problem setting the callback value",
            )),
        }
    }

    /// The first `otpauth://` URI among the outputs of the last response's callbacks.
    pub fn save_otp_auth_uri(&self) -> Option<String> {
        self.debug_log.log_value(
            "Last Callback Response When Looking For OtpAuthURI:",
            &self.last_response,
        );

        self.last_response
            .iter()
            .flat_map(|r| &r.callbacks)
            .flat_map(|c| c.output.iter().flatten())
            .find_map(|pair| match &pair.value {
                Value::String(s) if s.contains(OTP_AUTH_URI_MARKER) => Some(s.clone()),
                _ => None,
            })
    }

    /// Poll the configured inbox and store the trimmed result as the current OTP.
    pub async fn check_email(&mut self, params: &CheckEmailParams) -> Result<String, EmailError> {
        let inbox = self.inbox.as_ref().ok_or(EmailError::NoInbox)?;
        let value = check_email(inbox.as_ref(), params).await?.trim().to_owned();

        self.otp = Some(value.clone());
        Ok(value)
    }

    /// Apply `matchers` positionally to the callbacks of the last response.
    pub fn validate_callbacks(
        &self,
        matchers: &[Matcher<Callback>],
        step: &str,
        stage: Option<&str>,
    ) -> Result<(), JourneyError> {
        let response = self.require_response(step, stage, "validate callbacks")?;
        let reason = format!("Callback for step: {step}");

        for (position, matcher) in matchers.iter().enumerate() {
            match response.callbacks.get(position) {
                Some(callback) => matcher.check(&reason, callback)?,
                None => {
                    return Err(AssertionFailure {
                        reason,
                        expected: matcher.description().to_owned(),
                        actual: format!("no callback at position {position}"),
                    }
                    .into())
                }
            }
        }
        Ok(())
    }

    /// Apply every matcher to the last response.
    pub fn validate_response(
        &self,
        matchers: &[Matcher<AuthenticateResponse>],
        step: &str,
        stage: Option<&str>,
    ) -> Result<(), JourneyError> {
        let response = self.require_response(step, stage, "validate response")?;
        let reason = format!("Step: {step}");

        for matcher in matchers {
            matcher.check(&reason, response)?;
        }
        Ok(())
    }

    /// Apply every matcher to the error of the last turn.
    pub fn validate_error(
        &self,
        matchers: &[Matcher<AuthenticateError>],
        step: &str,
        stage: Option<&str>,
    ) -> Result<(), JourneyError> {
        let error = self.auth_error.as_ref().ok_or_else(|| {
            StepFailure::new(
                step,
                stage,
                "validate error",
                "There is no error response to validate",
            )
        })?;
        let reason = format!("Step: {step}");

        for matcher in matchers {
            matcher.check(&reason, error)?;
        }
        Ok(())
    }

    fn require_response(
        &self,
        step: &str,
        stage: Option<&str>,
        action: &str,
    ) -> Result<&AuthenticateResponse, StepFailure> {
        self.last_response.as_ref().ok_or_else(|| {
            let cause = self
                .auth_error
                .as_ref()
                .map_or("no request was sent", |e| e.message.as_str());
            StepFailure::new(
                step,
                stage,
                action,
                format!("Unexpected error response: {cause}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use aic_core::AmInstance;
    use aic_test::{fixtures, start_api_mock};
    use serde_json::json;
    use wiremock::{matchers, Mock, ResponseTemplate};

    use super::*;
    use crate::{
        assertions::{callbacks::name_callback, error::error_state, response::auth_id},
        NameValuePair,
    };

    fn new_journey(base_url: &str) -> Journey {
        let am = AmInstance::new(base_url).unwrap();
        Journey::new("Login", AmRealm::new("alpha", am))
    }

    fn with_response(callbacks: Vec<Callback>) -> Journey {
        new_journey("https://tenant.example.com").with_last_response(AuthenticateResponse {
            auth_id: Some("abc".to_owned()),
            callbacks,
            ..Default::default()
        })
    }

    fn output_callback(values: &[&str]) -> Callback {
        Callback {
            output: Some(
                values
                    .iter()
                    .map(|v| NameValuePair::new("value", *v))
                    .collect(),
            ),
            ..Callback::new(CallbackType::TextOutputCallback)
        }
    }

    #[tokio::test]
    async fn first_turn_posts_empty_body_with_fixed_parameters() {
        let mock = Mock::given(matchers::method("POST"))
            .and(matchers::path("/am/json/authenticate"))
            .and(matchers::query_param("realm", "alpha"))
            .and(matchers::query_param("authIndexType", "service"))
            .and(matchers::query_param("authIndexValue", "Login"))
            .and(matchers::query_param("locale", "en"))
            .and(matchers::header("is-journey-test", "true"))
            .and(matchers::header("x-requested-with", CLIENT_NAME))
            .and(matchers::header("accept-api-version", ACCEPT_API_VERSION))
            .and(matchers::header("x-custom", "1"))
            .and(matchers::header("cookie", "session=s1"))
            .and(matchers::body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::authenticate_response(
                "auth-1",
                vec![fixtures::name_callback(0, "User Name")],
            )))
            .expect(1);
        let server = start_api_mock(vec![mock]).await;

        let mut headers = HeaderMap::new();
        headers.insert("x-custom", HeaderValue::from_static("1"));
        let mut journey = new_journey(&server.uri())
            .with_headers(headers)
            .with_query_params([("locale", "en"), ("realm", "ignored")])
            .with_cookie(CookieParam::new("session", "s1"));

        let response = journey.next_step().await.unwrap();
        assert_eq!(response.auth_id.as_deref(), Some("auth-1"));
        assert!(journey.auth_error().is_none());
        assert_eq!(journey.cur_callbacks().map(<[Callback]>::len), Some(1));
    }

    #[tokio::test]
    async fn failed_turn_replaces_response_with_error() {
        let mock = Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": 401,
                "reason": "Unauthorized",
                "message": "Login failure"
            })));
        let server = start_api_mock(vec![mock]).await;

        let mut journey = new_journey(&server.uri());
        journey.last_response = Some(AuthenticateResponse::default());

        assert!(journey.next_step().await.is_none());
        assert!(journey.last_response().is_none());
        assert!(journey.cur_callbacks().is_none());

        let error = journey.auth_error().unwrap();
        assert_eq!(error.status, Some(reqwest::StatusCode::UNAUTHORIZED));
        assert_eq!(error.message, "Response code 401 (Unauthorized)");

        journey
            .validate_error(&[error_state(Some("Response code 401 (Unauthorized)"))], "login", None)
            .unwrap();

        let err = journey
            .validate_response(&[auth_id(None)], "login", Some("postStep validation response"))
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Message: Unexpected error response: Response code 401 (Unauthorized)"));
    }

    #[test]
    fn set_value_fills_first_matching_callback() {
        let mut journey = with_response(vec![
            serde_json::from_value(fixtures::name_callback(0, "User Name")).unwrap(),
            serde_json::from_value(fixtures::password_callback(1, "Password")).unwrap(),
        ]);

        journey
            .set_value(&CallbackType::PasswordCallback, "secret", "pass", None)
            .unwrap();

        let callbacks = journey.cur_callbacks().unwrap();
        assert_eq!(callbacks[1].first_input_value(), Some(&json!("secret")));
        assert_eq!(callbacks[0].first_input_value(), Some(&json!("")));
    }

    #[test]
    fn set_value_only_reaches_first_of_repeated_type() {
        let mut journey = with_response(vec![
            serde_json::from_value(fixtures::name_callback(0, "User Name")).unwrap(),
            serde_json::from_value(fixtures::name_callback(1, "Nickname")).unwrap(),
        ]);

        journey
            .set_value(&CallbackType::NameCallback, "alice", "user", None)
            .unwrap();
        journey
            .set_value(&CallbackType::NameCallback, "bob", "user", None)
            .unwrap();

        let callbacks = journey.cur_callbacks().unwrap();
        assert_eq!(callbacks[0].first_input_value(), Some(&json!("bob")));
        assert_eq!(callbacks[1].first_input_value(), Some(&json!("")));
    }

    #[test]
    fn set_value_reports_missing_callback() {
        let mut journey = with_response(vec![]);
        let err = journey
            .set_value(&CallbackType::NameCallback, "alice", "user", Some("preStep actions"))
            .unwrap_err();
        assert_eq!(err.message, "There was a problem setting the callback value");
        assert_eq!(err.action.as_deref(), Some("set NameCallback to alice"));

        let mut empty = new_journey("https://tenant.example.com");
        let err = empty
            .set_value(&CallbackType::NameCallback, "alice", "user", None)
            .unwrap_err();
        assert_eq!(err.message, "Callbacks are undefined");
    }

    #[test]
    fn set_value_requires_an_input_slot() {
        let mut journey = with_response(vec![output_callback(&["Welcome"])]);
        assert!(journey
            .set_value(&CallbackType::TextOutputCallback, "x", "s", None)
            .is_err());
    }

    #[test]
    fn save_otp_auth_uri_returns_first_match() {
        let journey = with_response(vec![
            output_callback(&["Scan the code"]),
            output_callback(&[
                "otpauth://totp/A:first?secret=JBSWY3DPEHPK3PXP",
                "otpauth://totp/A:second?secret=JBSWY3DPEHPK3PXP",
            ]),
        ]);

        assert_eq!(
            journey.save_otp_auth_uri().as_deref(),
            Some("otpauth://totp/A:first?secret=JBSWY3DPEHPK3PXP")
        );
        assert!(with_response(vec![output_callback(&["nothing"])])
            .save_otp_auth_uri()
            .is_none());
    }

    #[test]
    fn validate_callbacks_is_positional() {
        let journey = with_response(vec![serde_json::from_value(fixtures::name_callback(
            0,
            "User Name",
        ))
        .unwrap()]);

        journey
            .validate_callbacks(&[name_callback(Some("User Name"))], "user", None)
            .unwrap();

        let err = journey
            .validate_callbacks(&[name_callback(None), name_callback(None)], "user", None)
            .unwrap_err();
        match err {
            JourneyError::Assertion(failure) => {
                assert_eq!(failure.reason, "Callback for step: user");
                assert_eq!(failure.actual, "no callback at position 1");
            }
            other => panic!("expected assertion failure, got {other:?}"),
        }
    }

    #[test]
    fn validate_error_requires_an_error() {
        let journey = with_response(vec![]);
        let err = journey.validate_error(&[], "user", None).unwrap_err();
        assert!(err
            .to_string()
            .contains("Message: There is no error response to validate"));
    }
}
