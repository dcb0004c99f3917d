//! Matchers over a single callback.
//!
//! A matcher built with no expectations only checks the callback type. Every expectation adds
//! a check on the named `output` entry; prompt-style matchers also require an untouched
//! `IDToken*` input, and the structured ones require any `IDToken*` input.

use serde_json::{json, Value};

use crate::{Callback, CallbackType, Matcher};

const INPUT_TOKEN_PREFIX: &str = "IDToken";

fn of_type(callback_type: CallbackType) -> Matcher<Callback> {
    Matcher::new(
        format!("a {callback_type}"),
        move |callback: &Callback| callback.callback_type == callback_type,
    )
}

fn has_output(name: &'static str, expected: Value) -> Matcher<Callback> {
    Matcher::new(
        format!("output {name:?} equal to {expected}"),
        move |callback: &Callback| callback.output_value(name) == Some(&expected),
    )
}

fn input_token(require_empty: bool) -> Matcher<Callback> {
    let description = if require_empty {
        "an empty IDToken input"
    } else {
        "an IDToken input"
    };

    Matcher::new(description, move |callback: &Callback| {
        callback.input.iter().flatten().any(|pair| {
            pair.name.starts_with(INPUT_TOKEN_PREFIX)
                && (!require_empty || pair.value == Value::String(String::new()))
        })
    })
}

/// Type check plus the given output checks and an input token check.
///
/// With no output checks only the type is checked.
fn structured(
    callback_type: CallbackType,
    outputs: Vec<Matcher<Callback>>,
    require_empty_input: bool,
) -> Matcher<Callback> {
    if outputs.is_empty() {
        return of_type(callback_type);
    }

    let mut conditions = vec![of_type(callback_type)];
    conditions.extend(outputs);
    conditions.push(input_token(require_empty_input));
    Matcher::all_of(conditions)
}

fn prompted(callback_type: CallbackType, prompt: Option<&str>) -> Matcher<Callback> {
    let outputs = prompt
        .map(|prompt| vec![has_output("prompt", json!(prompt))])
        .unwrap_or_default();
    structured(callback_type, outputs, true)
}

fn push_output<T: Into<Value>>(
    outputs: &mut Vec<Matcher<Callback>>,
    name: &'static str,
    expected: Option<T>,
) {
    if let Some(expected) = expected {
        outputs.push(has_output(name, expected.into()));
    }
}

#[allow(missing_docs)]
pub fn name_callback(prompt: Option<&str>) -> Matcher<Callback> {
    prompted(CallbackType::NameCallback, prompt)
}

#[allow(missing_docs)]
pub fn password_callback(prompt: Option<&str>) -> Matcher<Callback> {
    prompted(CallbackType::PasswordCallback, prompt)
}

#[allow(missing_docs)]
pub fn validated_create_password_callback(prompt: Option<&str>) -> Matcher<Callback> {
    prompted(CallbackType::ValidatedCreatePasswordCallback, prompt)
}

#[allow(missing_docs)]
pub fn validated_create_username_callback(prompt: Option<&str>) -> Matcher<Callback> {
    prompted(CallbackType::ValidatedCreateUsernameCallback, prompt)
}

#[allow(missing_docs)]
pub fn string_attribute_input_callback(prompt: Option<&str>) -> Matcher<Callback> {
    prompted(CallbackType::StringAttributeInputCallback, prompt)
}

#[allow(missing_docs)]
pub fn boolean_attribute_input_callback(prompt: Option<&str>) -> Matcher<Callback> {
    prompted(CallbackType::BooleanAttributeInputCallback, prompt)
}

/// Placeholder for a position whose callback is not asserted on.
pub fn ignore_callback() -> Matcher<Callback> {
    Matcher::anything()
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Default)]
pub struct TextOutputFields {
    pub message: Option<String>,
    pub message_type: Option<String>,
}

/// Matches a `TextOutputCallback`. Both expected fields must be present in `output`.
pub fn text_output_callback(expected: TextOutputFields) -> Matcher<Callback> {
    let mut outputs = Vec::new();
    push_output(&mut outputs, "message", expected.message);
    push_output(&mut outputs, "messageType", expected.message_type);

    if outputs.is_empty() {
        return of_type(CallbackType::TextOutputCallback);
    }

    let mut conditions = vec![of_type(CallbackType::TextOutputCallback)];
    conditions.extend(outputs);
    Matcher::all_of(conditions)
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Default)]
pub struct ConfirmationFields {
    pub prompt: Option<String>,
    pub message_type: Option<i64>,
    pub options: Option<Vec<String>>,
    pub option_type: Option<i64>,
}

#[allow(missing_docs)]
pub fn confirmation_callback(expected: ConfirmationFields) -> Matcher<Callback> {
    let mut outputs = Vec::new();
    push_output(&mut outputs, "prompt", expected.prompt);
    push_output(&mut outputs, "messageType", expected.message_type);
    push_output(&mut outputs, "options", expected.options);
    push_output(&mut outputs, "optionType", expected.option_type);
    structured(CallbackType::ConfirmationCallback, outputs, false)
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Default)]
pub struct ChoiceFields {
    pub prompt: Option<String>,
    pub choices: Option<Vec<String>>,
    pub default_choice: Option<i64>,
}

#[allow(missing_docs)]
pub fn choice_callback(expected: ChoiceFields) -> Matcher<Callback> {
    let mut outputs = Vec::new();
    push_output(&mut outputs, "prompt", expected.prompt);
    push_output(&mut outputs, "choices", expected.choices);
    push_output(&mut outputs, "defaultChoice", expected.default_choice);
    structured(CallbackType::ChoiceCallback, outputs, false)
}

/// `initial_value` is compared against the `value` output entry.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default)]
pub struct HiddenValueFields {
    pub id: Option<String>,
    pub initial_value: Option<String>,
}

#[allow(missing_docs)]
pub fn hidden_value_callback(expected: HiddenValueFields) -> Matcher<Callback> {
    let mut outputs = Vec::new();
    push_output(&mut outputs, "id", expected.id);
    push_output(&mut outputs, "value", expected.initial_value);
    structured(CallbackType::HiddenValueCallback, outputs, false)
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Default)]
pub struct TermsFields {
    pub version: Option<String>,
    pub terms: Option<String>,
    pub create_date: Option<String>,
}

#[allow(missing_docs)]
pub fn terms_and_conditions_callback(expected: TermsFields) -> Matcher<Callback> {
    let mut outputs = Vec::new();
    push_output(&mut outputs, "version", expected.version);
    push_output(&mut outputs, "terms", expected.terms);
    push_output(&mut outputs, "createDate", expected.create_date);
    structured(CallbackType::TermsAndConditionsCallback, outputs, false)
}
