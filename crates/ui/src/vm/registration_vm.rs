use screening_core::model::RegistrationDraft;
use services::RegistrationError;

use crate::views::ViewError;

/// Raw text of the registration form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub age: String,
}

impl RegistrationForm {
    /// # Errors
    ///
    /// Returns `ViewError::Invalid` when the age is not a whole number.
    /// Everything else is checked by `RegistrationDraft::validate`.
    pub fn to_draft(&self) -> Result<RegistrationDraft, ViewError> {
        let age = self
            .age
            .trim()
            .parse::<u8>()
            .map_err(|_| ViewError::Invalid("Please enter your age in years.".to_owned()))?;
        Ok(RegistrationDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            age,
        })
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.email, &self.age]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[must_use]
pub fn view_error_from_registration(err: &RegistrationError) -> ViewError {
    match err {
        RegistrationError::Invalid(_) => ViewError::Invalid(err.user_message()),
        RegistrationError::Api(_) => ViewError::Network,
        _ => ViewError::Rejected(err.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screening_core::model::ValidationError;

    fn form(age: &str) -> RegistrationForm {
        RegistrationForm {
            name: "Ada".into(),
            email: "ada@example.org".into(),
            age: age.into(),
        }
    }

    #[test]
    fn age_must_be_numeric() {
        assert_eq!(
            form("forty").to_draft(),
            Err(ViewError::Invalid("Please enter your age in years.".into()))
        );
        assert_eq!(form(" 42 ").to_draft().unwrap().age, 42);
    }

    #[test]
    fn incomplete_form_is_detected() {
        assert!(form("42").is_complete());
        assert!(!form("  ").is_complete());
    }

    #[test]
    fn validation_errors_stay_inline() {
        let err = RegistrationError::Invalid(ValidationError::InvalidEmail);
        assert_eq!(
            view_error_from_registration(&err),
            ViewError::Invalid("email address is not valid".into())
        );
        let rejected = RegistrationError::Rejected {
            message: "This email address is already registered.".into(),
        };
        assert_eq!(
            view_error_from_registration(&rejected),
            ViewError::Rejected("This email address is already registered.".into())
        );
    }
}
