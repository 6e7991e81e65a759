use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Millisecond Unix timestamp that identifies one restart request.
///
/// Two signals carrying the same stamp are the same request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestartStamp(i64);

impl RestartStamp {
    #[must_use]
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub fn at(time: DateTime<Utc>) -> Self {
        Self(time.timestamp_millis())
    }

    #[must_use]
    pub fn millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Debug for RestartStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RestartStamp({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOrigin {
    Idle,
    Navigation,
}

/// Request to discard local progress and start over at module 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartSignal {
    pub stamp: RestartStamp,
    pub origin: RestartOrigin,
}

impl RestartSignal {
    #[must_use]
    pub fn idle(at: DateTime<Utc>) -> Self {
        Self {
            stamp: RestartStamp::at(at),
            origin: RestartOrigin::Idle,
        }
    }

    #[must_use]
    pub fn navigation(stamp: RestartStamp) -> Self {
        Self {
            stamp,
            origin: RestartOrigin::Navigation,
        }
    }
}

/// Persisted one-shot directive left behind by a restart.
///
/// `needs_new_session` is cleared as soon as the fresh module-1 session
/// exists; the directive itself lives until module 1 is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartDirective {
    pub stamp: RestartStamp,
    pub needs_new_session: bool,
}

impl RestartDirective {
    #[must_use]
    pub fn issued(stamp: RestartStamp) -> Self {
        Self {
            stamp,
            needs_new_session: true,
        }
    }

    #[must_use]
    pub fn session_created(self) -> Self {
        Self {
            needs_new_session: false,
            ..self
        }
    }
}
