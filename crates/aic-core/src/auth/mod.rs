//! Service-account credential minting.
//!
//! A short-lived RS256 assertion is signed with the service account's private key and exchanged
//! for an access token through the JWT bearer grant of the tenant's OAuth2 endpoint.

mod client_config;
mod jwt;
mod token;

pub use client_config::ClientConfig;
pub use jwt::{encoding_key, sign_assertion, AssertionClaims, PrivateKeyFormat, JWT_VALIDITY_SECONDS};
pub use token::{access_token_endpoint, get_token, TokenError, JWT_BEARER_GRANT_TYPE};
