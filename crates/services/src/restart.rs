use tracing::{debug, info};

use screening_core::model::{FlowKey, RestartDirective, RestartSignal};
use storage::ProgressStore;

use crate::events::{EventBus, FlowEvent};
use crate::exit::ExitGuardHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    Applied,
    AlreadyHandled,
}

/// Applies forced restarts exactly once per stamp.
///
/// It does not decide when the user went idle; it only reacts to signals.
#[derive(Clone)]
pub struct RestartCoordinator {
    progress: ProgressStore,
    exit: ExitGuardHandle,
    events: EventBus,
}

impl RestartCoordinator {
    #[must_use]
    pub fn new(progress: ProgressStore, exit: ExitGuardHandle, events: EventBus) -> Self {
        Self {
            progress,
            exit,
            events,
        }
    }

    /// Reset local progress for `signal` unless that stamp was already handled.
    pub fn apply(&self, signal: RestartSignal) -> RestartOutcome {
        if self.progress.handled_restart() == Some(signal.stamp) {
            debug!(stamp = signal.stamp.millis(), "restart already handled");
            return RestartOutcome::AlreadyHandled;
        }

        self.exit.disarm();
        self.progress.reset(&FlowKey::GATES);
        self.progress.clear_module_marker();
        self.progress
            .set_restart_directive(RestartDirective::issued(signal.stamp));
        self.progress.set_handled_restart(signal.stamp);

        info!(
            stamp = signal.stamp.millis(),
            origin = ?signal.origin,
            "flow restarted from the beginning"
        );
        self.events.publish(FlowEvent::ConsentChanged);
        RestartOutcome::Applied
    }
}
