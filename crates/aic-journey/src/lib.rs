#![doc = include_str!("../README.md")]

mod actions;
pub mod assertions;
mod callback;
pub mod email;
mod error;
mod journey;
mod matcher;
mod processor;
mod step;
mod totp;

pub use actions::run_action;
pub use callback::{AuthenticateResponse, Callback, CallbackType, NameValuePair};
pub use email::{CheckEmailParams, Inbox};
pub use error::{
    step_message, AssertionFailure, AuthenticateError, JourneyError, StepFailure,
};
pub use journey::{CookieParam, Journey, ACCEPT_API_VERSION, CLIENT_NAME, JOURNEY_TEST_HEADER};
pub use matcher::Matcher;
pub use processor::{
    pre_process_journey_steps, process_journey_steps, process_step_operations, run_journey,
    RunJourney, StepStage,
};
pub use step::{Action, ActionType, JourneyStep, StepOperations, StepSource, Validation};
pub use totp::{generate_otp, Totp, TotpAlgorithm, TotpError};
