//! Guard against silently leaving an attempt that already counts.

use crate::model::{AttemptAccess, FlowProgress};

/// Host hooks used to keep the user on the page.
///
/// In a webview these map to `history.pushState` and a `beforeunload`
/// handler. Calls must be safe to repeat.
pub trait NavigationTrap {
    fn push_history_entry(&self);
    fn register_unload_handler(&self);
    fn release(&self);
}

/// A trap that does nothing, for hosts without navigation history.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTrap;

impl NavigationTrap for NoopTrap {
    fn push_history_entry(&self) {}
    fn register_unload_handler(&self) {}
    fn release(&self) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuardState {
    #[default]
    Disarmed,
    Armed,
    WarningShown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAttempt {
    Back,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// Guard is not armed; let the navigation happen.
    Proceed,
    /// Navigation was swallowed and the forfeiture warning must be shown.
    ShowWarning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    Leave,
    Stay,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitGuard {
    state: GuardState,
}

impl ExitGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> GuardState {
        self.state
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state != GuardState::Disarmed
    }

    /// Whether the guard belongs armed for this progress and ledger answer.
    #[must_use]
    pub fn should_arm(progress: &FlowProgress, access: &AttemptAccess) -> bool {
        progress.assessment_underway() && !access.is_completed()
    }

    /// Arm the guard. Returns `false` if it was already armed.
    pub fn arm(&mut self, trap: &dyn NavigationTrap) -> bool {
        if self.is_armed() {
            return false;
        }
        trap.push_history_entry();
        trap.register_unload_handler();
        self.state = GuardState::Armed;
        true
    }

    /// Disarm the guard. Returns `false` if it was not armed.
    pub fn disarm(&mut self, trap: &dyn NavigationTrap) -> bool {
        if !self.is_armed() {
            return false;
        }
        trap.release();
        self.state = GuardState::Disarmed;
        true
    }

    /// Handle a back/close attempt. While armed this never lets navigation through.
    pub fn intercept(
        &mut self,
        attempt: NavigationAttempt,
        trap: &dyn NavigationTrap,
    ) -> InterceptOutcome {
        if !self.is_armed() {
            return InterceptOutcome::Proceed;
        }
        match attempt {
            NavigationAttempt::Back => trap.push_history_entry(),
            NavigationAttempt::Close => trap.register_unload_handler(),
        }
        self.state = GuardState::WarningShown;
        InterceptOutcome::ShowWarning
    }

    /// User chose to stay on the assessment.
    pub fn stay(&mut self) {
        if self.state == GuardState::WarningShown {
            self.state = GuardState::Armed;
        }
    }

    /// User confirmed leaving from the warning dialog.
    ///
    /// Only honoured while the warning is visible; an armed guard without a
    /// visible warning keeps the user in place.
    pub fn confirm_exit(&mut self, trap: &dyn NavigationTrap) -> ExitDecision {
        match self.state {
            GuardState::Disarmed => ExitDecision::Leave,
            GuardState::Armed => ExitDecision::Stay,
            GuardState::WarningShown => {
                trap.release();
                self.state = GuardState::Disarmed;
                ExitDecision::Leave
            }
        }
    }
}

/// Text shown in the forfeiture dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForfeitWarning {
    pub remaining_attempts: Option<u32>,
}

impl ForfeitWarning {
    #[must_use]
    pub fn from_access(access: &AttemptAccess) -> Self {
        Self {
            remaining_attempts: access.remaining(),
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        let lead = "If you leave now, this attempt will be counted as used.";
        match self.remaining_attempts {
            Some(0) => format!("{lead} This is your last attempt."),
            Some(1) => format!("{lead} You will have 1 attempt left."),
            Some(n) => format!("{lead} You will have {n} attempts left."),
            None => lead.to_owned(),
        }
    }
}
