use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::{FieldOrder, all_messages, rule};
use crate::domain::users::user::normalize_email;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$")
        .expect("valid email pattern")
});

const FIELD_ORDER: &FieldOrder = &[
    ("username", "username"),
    ("email", "email"),
    ("password", "password"),
];

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Registration input after trimming and email normalization.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewAccount {
    #[validate(custom(function = "username_rules"))]
    pub username: String,
    #[validate(custom(function = "email_rules"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationInvalid {
    MissingFields,
    Rules(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn into_account(self) -> Result<NewAccount, RegistrationInvalid> {
        if self.username.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.trim().is_empty()
        {
            return Err(RegistrationInvalid::MissingFields);
        }
        let account = NewAccount {
            username: self.username.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        };
        account
            .validate()
            .map_err(|errors| RegistrationInvalid::Rules(all_messages(&errors, FIELD_ORDER)))?;
        Ok(account)
    }
}

impl LoginRequest {
    /// `None` when either field is missing or empty.
    pub fn into_credentials(self) -> Option<Credentials> {
        let email = self.email.filter(|e| !e.is_empty())?;
        let password = self.password.filter(|p| !p.is_empty())?;
        Some(Credentials {
            email: normalize_email(&email),
            password,
        })
    }
}

fn username_rules(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < 3 {
        return Err(rule("minlength", "Username must be at least 3 characters"));
    }
    if len > 30 {
        return Err(rule("maxlength", "Username cannot exceed 30 characters"));
    }
    Ok(())
}

fn email_rules(value: &str) -> Result<(), ValidationError> {
    if EMAIL_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(rule("match", "Please provide a valid email"))
    }
}
