//! Declarative request schemas. Field rules are `validator` attributes; the
//! helpers here turn a `ValidationErrors` map back into the first failing
//! field in declaration order.

pub mod products;
pub mod users;

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Option<&'static str>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn body(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// (struct field, wire name) pairs in the order rules are reported.
pub(crate) type FieldOrder = [(&'static str, &'static str)];

pub(crate) fn first_error(errors: &ValidationErrors, order: &FieldOrder) -> Option<FieldError> {
    order.iter().find_map(|&(name, wire)| {
        errors
            .errors()
            .get(name)
            .and_then(first_message)
            .map(|message| FieldError::new(wire, message))
    })
}

pub(crate) fn all_messages(errors: &ValidationErrors, order: &FieldOrder) -> Vec<String> {
    order
        .iter()
        .filter_map(|&(name, _)| errors.errors().get(name))
        .filter_map(first_message)
        .collect()
}

fn first_message(kind: &ValidationErrorsKind) -> Option<String> {
    match kind {
        ValidationErrorsKind::Field(errs) => errs.first().map(message_of),
        ValidationErrorsKind::Struct(inner) => inner.errors().values().find_map(first_message),
        ValidationErrorsKind::List(items) => items
            .values()
            .find_map(|inner| inner.errors().values().find_map(first_message)),
    }
}

fn message_of(err: &ValidationError) -> String {
    err.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string())
}

pub(crate) fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub(crate) struct TextRules {
    pub min: usize,
    pub max: usize,
    pub not_text: &'static str,
    pub empty: &'static str,
    pub too_short: &'static str,
    pub too_long: &'static str,
}

impl TextRules {
    pub(crate) fn check(&self, value: &TextInput) -> Result<(), ValidationError> {
        let Some(value) = value.as_str() else {
            return Err(rule("string.base", self.not_text));
        };
        let len = value.chars().count();
        if len == 0 {
            return Err(rule("string.empty", self.empty));
        }
        if len < self.min {
            return Err(rule("string.min", self.too_short));
        }
        if len > self.max {
            return Err(rule("string.max", self.too_long));
        }
        Ok(())
    }
}

/// A JSON string. Anything else is kept so the rule can name the field
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Text(String),
    Other(serde_json::Value),
}

impl TextInput {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TextInput::Text(s) => Some(s),
            TextInput::Other(_) => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            TextInput::Text(s) => Some(s),
            TextInput::Other(_) => None,
        }
    }
}

/// A JSON boolean, or the strings `"true"`/`"false"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagInput {
    Flag(bool),
    Other(serde_json::Value),
}

impl FlagInput {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagInput::Flag(b) => Some(*b),
            FlagInput::Other(serde_json::Value::String(s)) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            FlagInput::Other(_) => None,
        }
    }
}

/// A JSON number, or a string holding one. Anything else is kept so the
/// rule can report it instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl NumberInput {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            NumberInput::Number(n) => *n,
            NumberInput::Text(s) => s.trim().parse::<f64>().ok()?,
            NumberInput::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Distinguishes an absent field from an explicit `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum DoubleOption<T> {
    NotProvided,
    Null,
    Some(T),
}

impl<T> Default for DoubleOption<T> {
    fn default() -> Self {
        DoubleOption::NotProvided
    }
}

/// Keeps an explicit `null` as a value for the field's rule to reject;
/// only an absent key becomes `None` (pair with `#[serde(default)]`).
pub(crate) fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub(crate) fn deserialize_double_option<'de, D, T>(
    deserializer: D,
) -> Result<DoubleOption<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(|opt| match opt {
        None => DoubleOption::Null,
        Some(value) => DoubleOption::Some(value),
    })
}
