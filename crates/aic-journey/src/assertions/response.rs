//! Matchers over top-level properties of an authenticate response.
//!
//! Each matcher checks that its property is present when called with `None`, and that it
//! equals the expected value otherwise. An expected empty string never matches, even against
//! an empty property.

use crate::{AuthenticateResponse, Matcher};

fn property(
    name: &'static str,
    expected: Option<&str>,
    get: fn(&AuthenticateResponse) -> Option<&str>,
) -> Matcher<AuthenticateResponse> {
    match expected {
        None => Matcher::new(format!("a response with a defined {name}"), move |r| {
            get(r).is_some()
        }),
        Some("") => Matcher::nothing(format!("a response with a non-empty expected {name}")),
        Some(expected) => {
            let description = format!("a response with {name} {expected:?}");
            let expected = expected.to_owned();
            Matcher::new(description, move |r| get(r) == Some(expected.as_str()))
        }
    }
}

#[allow(missing_docs)]
pub fn auth_id(expected: Option<&str>) -> Matcher<AuthenticateResponse> {
    property("authId", expected, |r| r.auth_id.as_deref())
}

#[allow(missing_docs)]
pub fn header(expected: Option<&str>) -> Matcher<AuthenticateResponse> {
    property("header", expected, |r| r.header.as_deref())
}

#[allow(missing_docs)]
pub fn description(expected: Option<&str>) -> Matcher<AuthenticateResponse> {
    property("description", expected, |r| r.description.as_deref())
}

#[allow(missing_docs)]
pub fn success_url(expected: Option<&str>) -> Matcher<AuthenticateResponse> {
    property("successUrl", expected, |r| r.success_url.as_deref())
}

/// Also usable as a "journey completed" check when called with `None`.
pub fn token_id(expected: Option<&str>) -> Matcher<AuthenticateResponse> {
    property("tokenId", expected, |r| r.token_id.as_deref())
}
