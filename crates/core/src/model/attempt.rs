use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ModuleId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptStatusError {
    #[error("attempt count {count} exceeds the maximum of {max}")]
    CountExceedsMax { count: u32, max: u32 },
}

/// Authoritative attempt state as reported by the remote ledger.
///
/// Never persisted locally. `allowed` is derived, so it always equals
/// `count < max_attempts && !is_completed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptStatus {
    allowed: bool,
    is_completed: bool,
    count: u32,
    max_attempts: u32,
    last_module_completed: Option<ModuleId>,
    completion_message: Option<String>,
}

impl AttemptStatus {
    /// Build a status from ledger fields.
    ///
    /// # Errors
    ///
    /// Returns `AttemptStatusError::CountExceedsMax` if the ledger reports more
    /// attempts than allowed.
    pub fn from_ledger(
        count: u32,
        max_attempts: u32,
        is_completed: bool,
        last_module_completed: Option<ModuleId>,
        completion_message: Option<String>,
    ) -> Result<Self, AttemptStatusError> {
        if count > max_attempts {
            return Err(AttemptStatusError::CountExceedsMax {
                count,
                max: max_attempts,
            });
        }

        Ok(Self {
            allowed: count < max_attempts && !is_completed,
            is_completed,
            count,
            max_attempts,
            last_module_completed,
            completion_message: completion_message.filter(|m| !m.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.max_attempts - self.count
    }

    #[must_use]
    pub fn last_module_completed(&self) -> Option<ModuleId> {
        self.last_module_completed
    }

    #[must_use]
    pub fn completion_message(&self) -> Option<&str> {
        self.completion_message.as_deref()
    }
}

/// What the flow knows about attempts right now.
///
/// `Unavailable` means the ledger could not be reached; it never grants access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptAccess {
    Known(AttemptStatus),
    Unavailable,
}

impl AttemptAccess {
    #[must_use]
    pub fn allows_new_attempt(&self) -> bool {
        match self {
            AttemptAccess::Known(status) => status.allowed(),
            AttemptAccess::Unavailable => false,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, AttemptAccess::Known(status) if status.is_completed())
    }

    #[must_use]
    pub fn status(&self) -> Option<&AttemptStatus> {
        match self {
            AttemptAccess::Known(status) => Some(status),
            AttemptAccess::Unavailable => None,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> Option<u32> {
        self.status().map(AttemptStatus::remaining)
    }

    #[must_use]
    pub fn last_module_completed(&self) -> Option<ModuleId> {
        self.status().and_then(AttemptStatus::last_module_completed)
    }

    /// Why a new attempt cannot start, if it cannot.
    #[must_use]
    pub fn block_reason(&self) -> Option<AttemptBlock> {
        match self {
            AttemptAccess::Unavailable => Some(AttemptBlock::LedgerUnavailable),
            AttemptAccess::Known(status) if status.is_completed() => {
                Some(AttemptBlock::Completed {
                    message: status.completion_message().map(str::to_owned),
                })
            }
            AttemptAccess::Known(status) if !status.allowed() => Some(AttemptBlock::Exhausted {
                max_attempts: status.max_attempts(),
            }),
            AttemptAccess::Known(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptBlock {
    Completed { message: Option<String> },
    Exhausted { max_attempts: u32 },
    LedgerUnavailable,
}

impl AttemptBlock {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            AttemptBlock::Completed { message: Some(message) } => message.clone(),
            AttemptBlock::Completed { message: None } => {
                "You have already completed the screening.".to_owned()
            }
            AttemptBlock::Exhausted { max_attempts } => {
                format!("You have used all {max_attempts} attempts for this screening.")
            }
            AttemptBlock::LedgerUnavailable => {
                "We could not confirm your remaining attempts. Please try again shortly."
                    .to_owned()
            }
        }
    }
}
