//! Declarative journey definitions.

use std::fmt;

use crate::{
    email::CheckEmailParams, AuthenticateError, AuthenticateResponse, Callback, CallbackType,
    Matcher,
};

/// Kind of an [`Action`]. Each kind maps to exactly one handler.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionType {
    CreateOtp,
    SetNameCallbackValue,
    SetPasswordCallbackValue,
    CheckEmail,
    SetOtp,
    SetCallbackValue,
    SaveOtpAuthUri,
}

impl ActionType {
    #[allow(missing_docs)]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateOtp => "createOTP",
            Self::SetNameCallbackValue => "setNameCallbackValue",
            Self::SetPasswordCallbackValue => "setPasswordCallbackValue",
            Self::CheckEmail => "checkEmail",
            Self::SetOtp => "setOTP",
            Self::SetCallbackValue => "setCallbackValue",
            Self::SaveOtpAuthUri => "saveOtpAuthURI",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutation of the journey state, run before or after a turn.
///
/// Which of the optional fields are required depends on `action`; missing ones are reported
/// when the action runs.
#[derive(Clone, Debug)]
pub struct Action {
    #[allow(missing_docs)]
    pub action: ActionType,
    #[allow(missing_docs)]
    pub callback_type: Option<CallbackType>,
    #[allow(missing_docs)]
    pub value: Option<String>,
    #[allow(missing_docs)]
    pub check_email_params: Option<CheckEmailParams>,
}

impl Action {
    #[allow(missing_docs)]
    pub fn new(action: ActionType) -> Self {
        Self {
            action,
            callback_type: None,
            value: None,
            check_email_params: None,
        }
    }

    #[allow(missing_docs)]
    pub fn with_callback_type(mut self, callback_type: CallbackType) -> Self {
        self.callback_type = Some(callback_type);
        self
    }

    #[allow(missing_docs)]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[allow(missing_docs)]
    pub fn with_check_email_params(mut self, params: CheckEmailParams) -> Self {
        self.check_email_params = Some(params);
        self
    }

    /// Fill the first `NameCallback`.
    pub fn set_name_callback_value(value: impl Into<String>) -> Self {
        Self::new(ActionType::SetNameCallbackValue).with_value(value)
    }

    /// Fill the first `PasswordCallback`.
    pub fn set_password_callback_value(value: impl Into<String>) -> Self {
        Self::new(ActionType::SetPasswordCallbackValue).with_value(value)
    }

    /// Fill the first callback of `callback_type`.
    pub fn set_callback_value(callback_type: CallbackType, value: impl Into<String>) -> Self {
        Self::new(ActionType::SetCallbackValue)
            .with_callback_type(callback_type)
            .with_value(value)
    }

    /// Remember the `otpauth://` URI presented in the last response.
    pub fn save_otp_auth_uri() -> Self {
        Self::new(ActionType::SaveOtpAuthUri)
    }

    /// Derive a code from the remembered URI. Use [`Action::with_value`] to pass a URI instead.
    pub fn create_otp() -> Self {
        Self::new(ActionType::CreateOtp)
    }

    /// Fill the first callback of `callback_type` with the current code.
    pub fn set_otp(callback_type: CallbackType) -> Self {
        Self::new(ActionType::SetOtp).with_callback_type(callback_type)
    }

    /// Fetch a code from the inbox.
    pub fn check_email(params: CheckEmailParams) -> Self {
        Self::new(ActionType::CheckEmail).with_check_email_params(params)
    }
}

/// Matchers applied to the journey state. Absent lists are skipped.
#[derive(Clone, Debug, Default)]
pub struct Validation {
    /// Applied positionally to the callbacks of the last response.
    pub callbacks: Option<Vec<Matcher<Callback>>>,
    #[allow(missing_docs)]
    pub response: Option<Vec<Matcher<AuthenticateResponse>>>,
    #[allow(missing_docs)]
    pub error: Option<Vec<Matcher<AuthenticateError>>>,
}

/// Validations and actions run at one stage of a step.
#[derive(Clone, Debug, Default)]
pub struct StepOperations {
    #[allow(missing_docs)]
    pub actions: Option<Vec<Action>>,
    #[allow(missing_docs)]
    pub validation: Option<Validation>,
}

impl StepOperations {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action; actions run in the order they were added.
    pub fn action(mut self, action: Action) -> Self {
        self.actions.get_or_insert_with(Vec::new).push(action);
        self
    }

    #[allow(missing_docs)]
    pub fn validate_callbacks(mut self, matchers: Vec<Matcher<Callback>>) -> Self {
        self.validation_mut().callbacks = Some(matchers);
        self
    }

    #[allow(missing_docs)]
    pub fn validate_response(mut self, matchers: Vec<Matcher<AuthenticateResponse>>) -> Self {
        self.validation_mut().response = Some(matchers);
        self
    }

    #[allow(missing_docs)]
    pub fn validate_error(mut self, matchers: Vec<Matcher<AuthenticateError>>) -> Self {
        self.validation_mut().error = Some(matchers);
        self
    }

    fn validation_mut(&mut self) -> &mut Validation {
        self.validation.get_or_insert_with(Validation::default)
    }
}

/// One turn of a journey with the operations around it.
#[derive(Clone, Debug)]
pub struct JourneyStep {
    #[allow(missing_docs)]
    pub name: String,
    /// Runs before the turn is submitted.
    pub pre_step: Option<StepOperations>,
    /// Runs after the response (or error) of the turn arrived.
    pub post_step: Option<StepOperations>,
}

impl JourneyStep {
    #[allow(missing_docs)]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pre_step: None,
            post_step: None,
        }
    }

    #[allow(missing_docs)]
    pub fn pre_step(mut self, operations: StepOperations) -> Self {
        self.pre_step = Some(operations);
        self
    }

    #[allow(missing_docs)]
    pub fn post_step(mut self, operations: StepOperations) -> Self {
        self.post_step = Some(operations);
        self
    }
}

/// An entry of a journey definition: a step, or a producer resolved right before the run.
pub enum StepSource {
    #[allow(missing_docs)]
    Step(JourneyStep),
    #[allow(missing_docs)]
    Deferred(Box<dyn FnOnce() -> JourneyStep + Send>),
}

impl StepSource {
    #[allow(missing_docs)]
    pub fn deferred(producer: impl FnOnce() -> JourneyStep + Send + 'static) -> Self {
        Self::Deferred(Box::new(producer))
    }

    /// The literal step, calling the producer if needed.
    pub fn resolve(self) -> JourneyStep {
        match self {
            Self::Step(step) => step,
            Self::Deferred(producer) => producer(),
        }
    }
}

impl From<JourneyStep> for StepSource {
    fn from(step: JourneyStep) -> Self {
        Self::Step(step)
    }
}

impl fmt::Debug for StepSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(step) => f.debug_tuple("Step").field(step).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}
