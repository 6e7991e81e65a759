//! Shared error types for the services crate.

use thiserror::Error;

use screening_core::model::{AttemptBlock, AttemptStatusError, FlowKey, ValidationError};

/// Errors emitted by `ScreeningApi` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("screening api request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("screening api url is invalid: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("screening api unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `RegistrationService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("{message}")]
    Rejected { message: String },
    #[error("registration succeeded but no user id was returned")]
    MissingUserId,
    #[error("verification link is empty")]
    EmptyToken,
    #[error("no pending registration to verify")]
    NoPendingUser,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl RegistrationError {
    /// Text suitable for showing next to the form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            RegistrationError::Rejected { message } => message.clone(),
            RegistrationError::Invalid(err) => err.to_string(),
            RegistrationError::Api(_) | RegistrationError::MissingUserId => {
                "We could not reach the screening service. Please try again.".to_owned()
            }
            other => other.to_string(),
        }
    }
}

/// Errors emitted by `AttemptGovernor`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptError {
    #[error(transparent)]
    Ledger(#[from] AttemptStatusError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `SessionLifecycleClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("another session request is already in flight")]
    InFlight,
    #[error("no module session is active")]
    NoActiveSession,
    #[error("{message}")]
    Rejected { message: String },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `ScreeningFlowService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error("no screening user is registered")]
    NotRegistered,
    #[error("email address is not verified yet")]
    NotVerified,
    #[error("{} cannot be set before the earlier steps", .0.as_str())]
    OutOfOrder(FlowKey),
    #[error("{}", .0.message())]
    AttemptBlocked(AttemptBlock),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Api(#[from] ApiError),
}
