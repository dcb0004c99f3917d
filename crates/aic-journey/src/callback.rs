//! Wire model of the `/authenticate` protocol.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

macro_rules! callback_types {
    ($($variant:ident),+ $(,)?) => {
        /// Semantic kind of a callback.
        ///
        /// Unknown kinds returned by the platform are kept verbatim in [`CallbackType::Other`] so
        /// they survive being echoed back on the next submission.
        #[allow(missing_docs)]
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum CallbackType {
            $($variant,)+
            Other(String),
        }

        impl CallbackType {
            #[allow(missing_docs)]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                    Self::Other(name) => name.as_str(),
                }
            }
        }

        impl From<String> for CallbackType {
            fn from(name: String) -> Self {
                match name.as_str() {
                    $(stringify!($variant) => Self::$variant,)+
                    _ => Self::Other(name),
                }
            }
        }
    };
}

callback_types!(
    BooleanAttributeInputCallback,
    ChoiceCallback,
    ConfirmationCallback,
    DeviceProfileCallback,
    HiddenValueCallback,
    KbaCreateCallback,
    MetadataCallback,
    NameCallback,
    NumberAttributeInputCallback,
    PasswordCallback,
    PollingWaitCallback,
    ReCaptchaCallback,
    RedirectCallback,
    SelectIdPCallback,
    StringAttributeInputCallback,
    SuspendedTextOutputCallback,
    TermsAndConditionsCallback,
    TextInputCallback,
    TextOutputCallback,
    ValidatedCreatePasswordCallback,
    ValidatedCreateUsernameCallback,
);

impl From<&str> for CallbackType {
    fn from(name: &str) -> Self {
        Self::from(name.to_owned())
    }
}

impl From<CallbackType> for String {
    fn from(callback_type: CallbackType) -> Self {
        match callback_type {
            CallbackType::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for CallbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named value inside a callback's `input` or `output` array.
///
/// Values are strings, numbers, booleans, `null` or string arrays on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NameValuePair {
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    #[serde(default)]
    pub value: Value,
}

impl NameValuePair {
    #[allow(missing_docs)]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One unit of requested input or presented output within a journey turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Callback {
    #[allow(missing_docs)]
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[allow(missing_docs)]
    #[serde(rename = "type")]
    pub callback_type: CallbackType,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<NameValuePair>>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<NameValuePair>>,
}

impl Callback {
    #[allow(missing_docs)]
    pub fn new(callback_type: CallbackType) -> Self {
        Self {
            id: None,
            callback_type,
            input: None,
            output: None,
        }
    }

    /// Value of the output entry called `name`.
    pub fn output_value(&self, name: &str) -> Option<&Value> {
        self.output
            .iter()
            .flatten()
            .find(|pair| pair.name == name)
            .map(|pair| &pair.value)
    }

    /// Value of the first input slot, the one the driver writes to.
    pub fn first_input_value(&self) -> Option<&Value> {
        self.input
            .as_deref()
            .and_then(<[NameValuePair]>::first)
            .map(|pair| &pair.value)
    }
}

/// One turn of the multi-step authentication protocol.
///
/// Fields not modelled here are kept in `extra` so that the whole document can be echoed back
/// on the next submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    /// Continuation token that must be echoed verbatim on the next submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_id: Option<String>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub callbacks: Vec<Callback>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Session token; its presence marks the successful end of the journey.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[allow(missing_docs)]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthenticateResponse {
    /// Whether the platform ended the journey successfully.
    pub fn is_complete(&self) -> bool {
        self.token_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_callbacks() {
        let response: AuthenticateResponse = serde_json::from_value(json!({
            "authId": "abc",
            "callbacks": [
                {
                    "type": "NameCallback",
                    "output": [{ "name": "prompt", "value": "User Name" }],
                    "input": [{ "name": "IDToken1", "value": "" }],
                    "_id": 0
                },
                {
                    "type": "ChoiceCallback",
                    "output": [
                        { "name": "choices", "value": ["sms", "email"] },
                        { "name": "defaultChoice", "value": 0 }
                    ],
                    "input": [{ "name": "IDToken2", "value": 0 }]
                }
            ],
            "header": "Sign In",
            "stage": "Login"
        }))
        .unwrap();

        assert_eq!(response.auth_id.as_deref(), Some("abc"));
        assert_eq!(response.callbacks.len(), 2);
        assert_eq!(response.callbacks[0].callback_type, CallbackType::NameCallback);
        assert_eq!(response.callbacks[0].id, Some(0));
        assert_eq!(
            response.callbacks[1].output_value("choices"),
            Some(&json!(["sms", "email"]))
        );
        assert!(!response.is_complete());
    }

    #[test]
    fn keeps_unknown_callback_types() {
        let callback: Callback = serde_json::from_value(json!({
            "type": "WebAuthnCallback",
            "output": []
        }))
        .unwrap();

        assert_eq!(
            callback.callback_type,
            CallbackType::Other("WebAuthnCallback".to_owned())
        );
        assert_eq!(
            serde_json::to_value(&callback).unwrap(),
            json!({ "type": "WebAuthnCallback", "output": [] })
        );
    }

    #[test]
    fn round_trips_unmodelled_fields() {
        let body = json!({
            "tokenId": "token",
            "successUrl": "/enduser/",
            "realm": "/alpha"
        });
        let response: AuthenticateResponse = serde_json::from_value(body).unwrap();

        assert!(response.is_complete());
        assert_eq!(response.extra.get("realm"), Some(&json!("/alpha")));

        let echoed = serde_json::to_value(&response).unwrap();
        assert_eq!(echoed["realm"], json!("/alpha"));
        assert_eq!(echoed["successUrl"], json!("/enduser/"));
        assert!(echoed.get("authId").is_none());
    }

    #[test]
    fn callback_type_display_matches_wire_name() {
        assert_eq!(CallbackType::PasswordCallback.to_string(), "PasswordCallback");
        assert_eq!(CallbackType::from("SelectIdPCallback"), CallbackType::SelectIdPCallback);
    }
}
