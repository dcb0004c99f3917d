//! Handlers behind every [`ActionType`].
//!
//! Each handler checks the fields it needs first and fails with a [`StepFailure`] naming the
//! step, stage and action when one is missing.

use tracing::debug;

use crate::{
    error::{JourneyError, StepFailure},
    step::{Action, ActionType},
    totp::generate_otp,
    CallbackType, Journey,
};

const VALUE_REQUIRED: &str = "A value is required to use the action setCallbackValue";

/// Run `action` against `journey`.
pub async fn run_action(
    journey: &mut Journey,
    action: &Action,
    step: &str,
    stage: &str,
) -> Result<(), JourneyError> {
    debug!(step, stage, action = %action.action, "running action");

    match action.action {
        ActionType::CreateOtp => create_otp(journey, action, step, stage),
        ActionType::SetNameCallbackValue => set_name_callback_value(journey, action, step, stage),
        ActionType::SetPasswordCallbackValue => {
            set_password_callback_value(journey, action, step, stage)
        }
        ActionType::CheckEmail => check_email(journey, action, step, stage).await,
        ActionType::SetOtp => set_otp(journey, action, step, stage),
        ActionType::SetCallbackValue => set_callback_value(journey, action, step, stage),
        ActionType::SaveOtpAuthUri => save_otp_auth_uri(journey, step, stage),
    }
}

fn save_otp_auth_uri(journey: &mut Journey, step: &str, stage: &str) -> Result<(), JourneyError> {
    let uri = journey.save_otp_auth_uri().ok_or_else(|| {
        StepFailure::new(
            step,
            Some(stage),
            "save otp auth URI",
            "Unable to find and save the otpAuthURI",
        )
    })?;

    debug!(step, "found OTP auth URI");
    journey.set_otp_auth_uri(uri);
    Ok(())
}

fn create_otp(
    journey: &mut Journey,
    action: &Action,
    step: &str,
    stage: &str,
) -> Result<(), JourneyError> {
    let uri = action
        .value
        .as_deref()
        .or(journey.otp_auth_uri())
        .ok_or_else(|| {
            StepFailure::new(
                step,
                Some(stage),
                "createOTP",
                "An OTP URI is required to generate a OTP, either provide it as a value with the action, or save it in a preceding step.",
            )
        })?;

    let otp = generate_otp(uri)?;
    debug!(step, "generated OTP");
    journey.set_otp(otp);
    Ok(())
}

fn set_name_callback_value(
    journey: &mut Journey,
    action: &Action,
    step: &str,
    stage: &str,
) -> Result<(), JourneyError> {
    let value = action.value.as_deref().ok_or_else(|| {
        StepFailure::new(step, Some(stage), "Set NameCallback Value", VALUE_REQUIRED)
    })?;
    journey.set_value(&CallbackType::NameCallback, value, step, Some(stage))?;
    Ok(())
}

fn set_password_callback_value(
    journey: &mut Journey,
    action: &Action,
    step: &str,
    stage: &str,
) -> Result<(), JourneyError> {
    let value = action.value.as_deref().ok_or_else(|| {
        StepFailure::new(step, Some(stage), "Set PasswordCallback Value", VALUE_REQUIRED)
    })?;
    journey.set_value(&CallbackType::PasswordCallback, value, step, Some(stage))?;
    Ok(())
}

async fn check_email(
    journey: &mut Journey,
    action: &Action,
    step: &str,
    stage: &str,
) -> Result<(), JourneyError> {
    let params = action.check_email_params.as_ref().ok_or_else(|| {
        StepFailure::new(
            step,
            Some(stage),
            "check email",
            "checkEmailParams are required to use the action checkEmail",
        )
    })?;

    journey.check_email(params).await?;
    Ok(())
}

fn set_otp(
    journey: &mut Journey,
    action: &Action,
    step: &str,
    stage: &str,
) -> Result<(), JourneyError> {
    let callback_type = action.callback_type.as_ref().ok_or_else(|| {
        StepFailure::new(
            step,
            Some(stage),
            "set OTP",
            "A callback type is required to use the action setOTP",
        )
    })?;

    let otp = action
        .value
        .clone()
        .or_else(|| journey.otp().map(str::to_owned))
        .ok_or_else(|| {
            StepFailure::new(
                step,
                Some(stage),
                "set OTP",
                "An otp code is required to use the setOTP action. Either provide one as a value or call another action to generate one.",
            )
        })?;

    journey.set_value(callback_type, &otp, step, Some(stage))?;
    Ok(())
}

fn set_callback_value(
    journey: &mut Journey,
    action: &Action,
    step: &str,
    stage: &str,
) -> Result<(), JourneyError> {
    let callback_type = action.callback_type.as_ref().ok_or_else(|| {
        StepFailure::new(
            step,
            Some(stage),
            "set callback value",
            "A callback type is required to use the action setCallbackValue",
        )
    })?;
    let value = action.value.as_deref().ok_or_else(|| {
        StepFailure::new(step, Some(stage), "set callback value", VALUE_REQUIRED)
    })?;

    journey.set_value(callback_type, value, step, Some(stage))?;
    Ok(())
}
