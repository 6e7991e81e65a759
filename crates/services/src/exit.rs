use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use screening_core::{
    ExitDecision, ExitGuard, GuardState, InterceptOutcome, NavigationAttempt, NavigationTrap,
    NoopTrap,
};

/// Shared handle on the exit guard plus the host's navigation trap.
#[derive(Clone)]
pub struct ExitGuardHandle {
    guard: Arc<Mutex<ExitGuard>>,
    trap: Arc<dyn NavigationTrap + Send + Sync>,
}

impl Default for ExitGuardHandle {
    fn default() -> Self {
        Self::new(Arc::new(NoopTrap))
    }
}

impl ExitGuardHandle {
    #[must_use]
    pub fn new(trap: Arc<dyn NavigationTrap + Send + Sync>) -> Self {
        Self {
            guard: Arc::new(Mutex::new(ExitGuard::new())),
            trap,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ExitGuard> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> GuardState {
        self.lock().state()
    }

    pub fn arm(&self) {
        if self.lock().arm(self.trap.as_ref()) {
            debug!("exit guard armed");
        }
    }

    pub fn disarm(&self) {
        if self.lock().disarm(self.trap.as_ref()) {
            debug!("exit guard disarmed");
        }
    }

    #[must_use]
    pub fn intercept(&self, attempt: NavigationAttempt) -> InterceptOutcome {
        let outcome = self.lock().intercept(attempt, self.trap.as_ref());
        debug!(?attempt, ?outcome, "navigation intercepted");
        outcome
    }

    pub fn stay(&self) {
        self.lock().stay();
    }

    #[must_use]
    pub fn confirm_exit(&self) -> ExitDecision {
        self.lock().confirm_exit(self.trap.as_ref())
    }
}
