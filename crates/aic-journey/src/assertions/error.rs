//! Matchers over the error of a failed turn.

use crate::{AuthenticateError, Matcher};

/// Matches any failed turn, or only one whose message is exactly `message`.
pub fn error_state(message: Option<&str>) -> Matcher<AuthenticateError> {
    match message {
        None => Matcher::new("an error with a message", |_: &AuthenticateError| true),
        Some(message) => {
            let expected = message.to_owned();
            Matcher::new(
                format!("an error with message {message:?}"),
                move |error: &AuthenticateError| error.message == expected,
            )
        }
    }
}

/// Matches a turn rejected with HTTP `status`.
pub fn error_status(status: u16) -> Matcher<AuthenticateError> {
    Matcher::new(
        format!("an error with status {status}"),
        move |error: &AuthenticateError| error.status.map(|s| s.as_u16()) == Some(status),
    )
}
