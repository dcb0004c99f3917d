//! Ready-made matchers for journey validations.
//!
//! - [`callbacks`] match single [`Callback`](crate::Callback)s and are applied positionally to
//!   the callbacks of the last response.
//! - [`response`] match top-level properties of the last
//!   [`AuthenticateResponse`](crate::AuthenticateResponse).
//! - [`error`] match the [`AuthenticateError`](crate::AuthenticateError) of a failed turn.

pub mod callbacks;
pub mod error;
pub mod response;
