//! Decision table for entering the module runner.
//!
//! Getting this wrong creates a second remote session for the same attempt, so
//! every input combination maps to exactly one row below.

use crate::model::{ModuleId, RestartDirective};

/// Inputs collected right before the module runner starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartInputs {
    pub assessment_completed: bool,
    pub directive: Option<RestartDirective>,
    pub local_marker: Option<ModuleId>,
    pub ledger_last_completed: Option<ModuleId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDecision {
    /// The ledger says the assessment is finished; start nothing.
    AlreadyCompleted,
    /// A session for this module already exists; resume it without creating one.
    ResumeExisting(ModuleId),
    /// Resume after the last module the ledger recorded. Any local marker is stale.
    ResumeFromLedger(ModuleId),
    /// Abandon leftovers and create a brand-new module-1 session.
    StartFresh,
}

impl StartDecision {
    /// Module the runner should show.
    #[must_use]
    pub fn module(self) -> Option<ModuleId> {
        match self {
            StartDecision::AlreadyCompleted => None,
            StartDecision::ResumeExisting(module) | StartDecision::ResumeFromLedger(module) => {
                Some(module)
            }
            StartDecision::StartFresh => Some(ModuleId::FIRST),
        }
    }

    /// Whether the remote start call carries `resume = true`.
    #[must_use]
    pub fn resumes(self) -> bool {
        matches!(
            self,
            StartDecision::ResumeExisting(_) | StartDecision::ResumeFromLedger(_)
        )
    }

    #[must_use]
    pub fn creates_session(self) -> bool {
        matches!(self, StartDecision::StartFresh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Done,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForceRestart {
    /// Directive issued, no fresh session created yet.
    NeedsSession,
    /// Directive issued and its fresh session already exists.
    SessionCreated,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Present(ModuleId),
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ledger {
    Present(ModuleId),
    Absent,
}

/// Resolve the start decision. See the row numbers for the table layout.
#[must_use]
pub fn decide_module_start(inputs: StartInputs) -> StartDecision {
    let completion = if inputs.assessment_completed {
        Completion::Done
    } else {
        Completion::Open
    };
    let force = match inputs.directive {
        Some(directive) if directive.needs_new_session => ForceRestart::NeedsSession,
        Some(_) => ForceRestart::SessionCreated,
        None => ForceRestart::Inactive,
    };
    let marker = inputs.local_marker.map_or(Marker::Absent, Marker::Present);
    let ledger = inputs
        .ledger_last_completed
        .map_or(Ledger::Absent, Ledger::Present);

    match (completion, force, marker, ledger) {
        // 1
        (Completion::Done, _, _, _) => StartDecision::AlreadyCompleted,
        // 2
        (
            Completion::Open,
            ForceRestart::NeedsSession | ForceRestart::SessionCreated,
            Marker::Present(module),
            _,
        ) => StartDecision::ResumeExisting(module),
        // 2, marker lost after the fresh session was created
        (Completion::Open, ForceRestart::SessionCreated, Marker::Absent, _) => {
            StartDecision::ResumeExisting(ModuleId::FIRST)
        }
        // 3
        (Completion::Open, ForceRestart::NeedsSession, Marker::Absent, _) => {
            StartDecision::StartFresh
        }
        // 4
        (Completion::Open, ForceRestart::Inactive, _, Ledger::Present(last)) => {
            StartDecision::ResumeFromLedger(last)
        }
        // 5
        (Completion::Open, ForceRestart::Inactive, Marker::Present(module), Ledger::Absent) => {
            StartDecision::ResumeExisting(module)
        }
        // 6
        (Completion::Open, ForceRestart::Inactive, Marker::Absent, Ledger::Absent) => {
            StartDecision::StartFresh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RestartStamp;

    fn inputs() -> StartInputs {
        StartInputs {
            assessment_completed: false,
            directive: None,
            local_marker: None,
            ledger_last_completed: None,
        }
    }

    fn directive() -> Option<RestartDirective> {
        Some(RestartDirective::issued(RestartStamp::new(1_700_000_000_000)))
    }

    #[test]
    fn row1_completed_starts_nothing() {
        let decision = decide_module_start(StartInputs {
            assessment_completed: true,
            directive: directive(),
            local_marker: Some(ModuleId::FIRST),
            ledger_last_completed: Some(ModuleId::new(3)),
        });
        assert_eq!(decision, StartDecision::AlreadyCompleted);
        assert_eq!(decision.module(), None);
    }

    #[test]
    fn row2_forced_restart_with_saved_marker_resumes_existing() {
        let decision = decide_module_start(StartInputs {
            directive: directive(),
            local_marker: Some(ModuleId::FIRST),
            ..inputs()
        });
        assert_eq!(decision, StartDecision::ResumeExisting(ModuleId::FIRST));
        assert!(!decision.creates_session());
        assert!(decision.resumes());
    }

    #[test]
    fn row2_ignores_ledger_while_directive_is_active() {
        let decision = decide_module_start(StartInputs {
            directive: directive().map(RestartDirective::session_created),
            local_marker: Some(ModuleId::FIRST),
            ledger_last_completed: Some(ModuleId::new(3)),
            ..inputs()
        });
        assert_eq!(decision, StartDecision::ResumeExisting(ModuleId::FIRST));
    }

    #[test]
    fn row3_forced_restart_without_marker_starts_fresh() {
        let decision = decide_module_start(StartInputs {
            directive: directive(),
            ledger_last_completed: Some(ModuleId::new(3)),
            ..inputs()
        });
        assert_eq!(decision, StartDecision::StartFresh);
        assert_eq!(decision.module(), Some(ModuleId::FIRST));
    }

    #[test]
    fn row2_created_session_without_marker_resumes_module_one() {
        let decision = decide_module_start(StartInputs {
            directive: directive().map(RestartDirective::session_created),
            ledger_last_completed: Some(ModuleId::new(3)),
            ..inputs()
        });
        assert_eq!(decision, StartDecision::ResumeExisting(ModuleId::FIRST));
        assert!(!decision.creates_session());
    }

    #[test]
    fn row3_only_starts_fresh_while_a_session_is_still_needed() {
        let pending = decide_module_start(StartInputs {
            directive: directive(),
            ..inputs()
        });
        let created = decide_module_start(StartInputs {
            directive: directive().map(RestartDirective::session_created),
            ..inputs()
        });
        assert!(pending.creates_session());
        assert!(!created.creates_session());
    }

    #[test]
    fn row4_ledger_progress_resumes_without_restart() {
        let decision = decide_module_start(StartInputs {
            ledger_last_completed: Some(ModuleId::new(3)),
            ..inputs()
        });
        assert_eq!(decision, StartDecision::ResumeFromLedger(ModuleId::new(3)));
        assert!(!decision.creates_session());
    }

    #[test]
    fn row4_ledger_wins_over_conflicting_local_marker() {
        let decision = decide_module_start(StartInputs {
            local_marker: Some(ModuleId::new(2)),
            ledger_last_completed: Some(ModuleId::new(3)),
            ..inputs()
        });
        assert_eq!(decision, StartDecision::ResumeFromLedger(ModuleId::new(3)));
    }

    #[test]
    fn row5_local_marker_without_ledger_resumes_existing() {
        let decision = decide_module_start(StartInputs {
            local_marker: Some(ModuleId::FIRST),
            ..inputs()
        });
        assert_eq!(decision, StartDecision::ResumeExisting(ModuleId::FIRST));
    }

    #[test]
    fn row6_nothing_saved_starts_fresh_module_one() {
        let decision = decide_module_start(inputs());
        assert_eq!(decision, StartDecision::StartFresh);
        assert!(decision.creates_session());
        assert!(!decision.resumes());
    }
}
