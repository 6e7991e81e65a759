use std::sync::{Mutex, PoisonError};

use screening_core::NavigationTrap;
use tokio::sync::Notify;

use super::scripts::{PUSH_HISTORY_SCRIPT, REGISTER_UNLOAD_SCRIPT, RELEASE_SCRIPT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCommand {
    PushHistoryEntry,
    RegisterUnloadHandler,
    Release,
}

impl TrapCommand {
    #[must_use]
    pub fn script(self) -> &'static str {
        match self {
            TrapCommand::PushHistoryEntry => PUSH_HISTORY_SCRIPT,
            TrapCommand::RegisterUnloadHandler => REGISTER_UNLOAD_SCRIPT,
            TrapCommand::Release => RELEASE_SCRIPT,
        }
    }
}

/// `NavigationTrap` for the desktop webview.
///
/// The guard may be armed from any task, but scripts can only run inside the
/// UI runtime, so commands are queued here and drained by the root layout.
#[derive(Debug, Default)]
pub struct WebviewTrap {
    pending: Mutex<Vec<TrapCommand>>,
    wake: Notify,
}

impl WebviewTrap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, command: TrapCommand) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
        self.wake.notify_one();
    }

    /// Take everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<TrapCommand> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Wait until at least one command is queued, then drain.
    pub async fn next_batch(&self) -> Vec<TrapCommand> {
        loop {
            let batch = self.drain();
            if !batch.is_empty() {
                return batch;
            }
            self.wake.notified().await;
        }
    }
}

impl NavigationTrap for WebviewTrap {
    fn push_history_entry(&self) {
        self.queue(TrapCommand::PushHistoryEntry);
    }

    fn register_unload_handler(&self) {
        self.queue(TrapCommand::RegisterUnloadHandler);
    }

    fn release(&self) {
        self.queue(TrapCommand::Release);
    }
}
