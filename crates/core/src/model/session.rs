use crate::model::{ModuleId, SessionId};

/// Handle on the remote scored-module session that is currently running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSessionRef {
    pub module_id: ModuleId,
    pub session_id: SessionId,
}

impl ModuleSessionRef {
    #[must_use]
    pub fn new(module_id: ModuleId, session_id: SessionId) -> Self {
        Self {
            module_id,
            session_id,
        }
    }
}
