//! Canned `/authenticate` payloads in the shape the platform returns them.

use serde_json::{json, Value};

/// A `NameCallback` with an empty `IDToken` input.
pub fn name_callback(id: u32, prompt: &str) -> Value {
    json!({
        "type": "NameCallback",
        "output": [{ "name": "prompt", "value": prompt }],
        "input": [{ "name": format!("IDToken{}", id + 1), "value": "" }],
        "_id": id
    })
}

/// A `PasswordCallback` with an empty `IDToken` input.
pub fn password_callback(id: u32, prompt: &str) -> Value {
    json!({
        "type": "PasswordCallback",
        "output": [{ "name": "prompt", "value": prompt }],
        "input": [{ "name": format!("IDToken{}", id + 1), "value": "" }],
        "_id": id
    })
}

/// A `TextOutputCallback` carrying `message`, as used to display MFA registration URIs.
pub fn text_output_callback(id: u32, message: &str, message_type: &str) -> Value {
    json!({
        "type": "TextOutputCallback",
        "output": [
            { "name": "message", "value": message },
            { "name": "messageType", "value": message_type }
        ],
        "_id": id
    })
}

/// One turn of an in-progress journey.
pub fn authenticate_response(auth_id: &str, callbacks: Vec<Value>) -> Value {
    json!({
        "authId": auth_id,
        "callbacks": callbacks,
        "header": "Sign In",
        "description": "",
        "stage": "DataStore1"
    })
}

/// The terminal turn of a journey.
pub fn success_response(token_id: &str) -> Value {
    json!({
        "tokenId": token_id,
        "successUrl": "/enduser/?realm=/alpha",
        "realm": "/alpha"
    })
}
