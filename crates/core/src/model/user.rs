use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::UserId;

const MIN_AGE: u8 = 18;
const MAX_AGE: u8 = 120;
const MAX_NAME_LEN: usize = 120;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("name is required")]
    EmptyName,

    #[error("name is too long: {len} characters (max {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("age must be between {min} and {max}")]
    AgeOutOfRange { min: u8, max: u8 },

    #[error("language code is not valid: {raw:?}")]
    InvalidLanguage { raw: String },
}

/// The person currently taking the screening.
///
/// Created unverified on registration and flipped to verified by the email
/// verification callback. Only the identity store writes this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl ScreeningUser {
    #[must_use]
    pub fn unverified(id: UserId, registration: &Registration) -> Self {
        Self {
            id,
            name: registration.name().to_owned(),
            email: registration.email().to_owned(),
            verified: false,
            meta: None,
        }
    }

    #[must_use]
    pub fn into_verified(mut self) -> Self {
        self.verified = true;
        self
    }
}

/// Unvalidated registration form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub name: String,
    pub email: String,
    pub age: u8,
}

impl RegistrationDraft {
    /// Validate the draft before anything is sent to the backend.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an empty or overlong name, a malformed
    /// email, or an age outside the accepted range.
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let len = name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(ValidationError::NameTooLong {
                len,
                max: MAX_NAME_LEN,
            });
        }

        let email = self.email.trim().to_ascii_lowercase();
        if !looks_like_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }

        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(ValidationError::AgeOutOfRange {
                min: MIN_AGE,
                max: MAX_AGE,
            });
        }

        Ok(Registration {
            name,
            email,
            age: self.age,
        })
    }
}

/// Registration input that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    name: String,
    email: String,
    age: u8,
}

impl Registration {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn age(&self) -> u8 {
        self.age
    }
}

fn looks_like_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
