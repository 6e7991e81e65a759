use thiserror::Error;

use crate::model::{AttemptStatusError, ParseIdError, ValidationError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    AttemptStatus(#[from] AttemptStatusError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
