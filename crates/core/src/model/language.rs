use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::ValidationError;

/// Short language tag sent with attempt and session requests (`en`, `fa`, `pt-BR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse and normalize a language tag.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidLanguage` unless the tag is a 2-3 letter
    /// primary subtag optionally followed by `-` and a 2-4 character region.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let invalid = || ValidationError::InvalidLanguage {
            raw: raw.to_owned(),
        };

        let mut parts = trimmed.splitn(2, ['-', '_']);
        let primary = parts.next().ok_or_else(invalid)?;
        if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        let mut code = primary.to_ascii_lowercase();

        if let Some(region) = parts.next() {
            if !(2..=4).contains(&region.len()) || !region.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(invalid());
            }
            code.push('-');
            code.push_str(&region.to_ascii_uppercase());
        }

        Ok(Self(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self("en".to_owned())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(value: LanguageCode) -> Self {
        value.0
    }
}
