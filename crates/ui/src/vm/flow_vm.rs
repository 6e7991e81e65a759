use chrono::{DateTime, Utc};
use serde_json::json;

use screening_core::model::{AttemptBlock, ModuleSessionRef, RestartStamp};
use screening_core::{Stage, StageView};
use services::{FlowError, ModuleEntry, SessionError};

use crate::views::ViewError;

/// Map a flow failure to something the stage can show inline.
#[must_use]
pub fn view_error_from_flow(err: &FlowError) -> ViewError {
    match err {
        FlowError::NotRegistered | FlowError::NotVerified => {
            ViewError::Rejected("Please verify your email address first.".to_owned())
        }
        FlowError::OutOfOrder(_) => {
            ViewError::Rejected("Please finish the previous step first.".to_owned())
        }
        FlowError::AttemptBlocked(block) => ViewError::Blocked(block.message()),
        FlowError::Session(SessionError::InFlight) => ViewError::Busy,
        FlowError::Session(SessionError::Rejected { message }) => {
            ViewError::Rejected(message.clone())
        }
        FlowError::Session(SessionError::Api(_)) => ViewError::Network,
        _ => ViewError::Unknown,
    }
}

/// Body copy for the informational stages.
#[must_use]
pub fn stage_body(stage: Stage) -> &'static str {
    match stage {
        Stage::Unverified => "Create an account to begin the screening.",
        Stage::AwaitingVerification => {
            "We sent you an email. Open the link inside to verify your address, then come back here."
        }
        Stage::Disclaimer => {
            "This screening is not a diagnosis. Your answers are stored securely and reviewed by a clinician."
        }
        Stage::FalsePositive => {
            "Screening tools can flag people who turn out to be healthy. A positive result means a follow-up conversation, not a conclusion."
        }
        Stage::PreTest => {
            "The assessment takes about 30 minutes. Once you start, leaving early uses up one of your attempts."
        }
        Stage::Questionnaire => "Answer a few questions about your health history.",
        Stage::ModuleRunner => "Complete each timed module in order.",
        Stage::Completed => "Thank you for completing the screening.",
    }
}

/// What the pre-test briefing shows next to its start button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreTestVm {
    pub can_start: bool,
    pub notice: Option<String>,
    pub remaining: Option<u32>,
}

impl PreTestVm {
    #[must_use]
    pub fn from_view(view: &StageView) -> Self {
        let block = view.access.block_reason();
        Self {
            can_start: view.can_start_attempt(),
            notice: block.as_ref().map(AttemptBlock::message),
            remaining: view.access.remaining(),
        }
    }

    #[must_use]
    pub fn remaining_label(&self) -> Option<String> {
        match self.remaining? {
            0 => None,
            1 => Some("1 attempt remaining".to_owned()),
            n => Some(format!("{n} attempts remaining")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ModulePhase {
    #[default]
    Starting,
    Running(ModuleSessionRef),
    Submitting(ModuleSessionRef),
    Completed,
}

/// Module runner state. Only a running module may be submitted, once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleRunnerVm {
    phase: ModulePhase,
}

impl ModuleRunnerVm {
    #[must_use]
    pub fn phase(&self) -> &ModulePhase {
        &self.phase
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        matches!(self.phase, ModulePhase::Running(_))
    }

    #[must_use]
    pub fn module_number(&self) -> Option<u32> {
        match &self.phase {
            ModulePhase::Running(session) | ModulePhase::Submitting(session) => {
                Some(session.module_id.value())
            }
            ModulePhase::Starting | ModulePhase::Completed => None,
        }
    }

    /// Claim the running session for submission.
    pub fn begin_submit(&mut self) -> Option<ModuleSessionRef> {
        let ModulePhase::Running(session) = &self.phase else {
            return None;
        };
        let session = session.clone();
        self.phase = ModulePhase::Submitting(session.clone());
        Some(session)
    }

    pub fn apply(&mut self, entry: ModuleEntry) {
        self.phase = match entry {
            ModuleEntry::Running(session) => ModulePhase::Running(session),
            ModuleEntry::Completed => ModulePhase::Completed,
        };
    }

    /// Return to the running state after a failed submit so it can be retried.
    pub fn fail(&mut self) {
        if let ModulePhase::Submitting(session) = &self.phase {
            self.phase = ModulePhase::Running(session.clone());
        }
    }
}

/// Payload sent when a module finishes. Scoring happens elsewhere.
#[must_use]
pub fn module_payload(session: &ModuleSessionRef, finished_at: DateTime<Utc>) -> serde_json::Value {
    json!({
        "moduleId": session.module_id,
        "sessionId": session.session_id,
        "finishedAt": finished_at.to_rfc3339(),
    })
}

/// Parse the `restart` query value carried by a navigation.
#[must_use]
pub fn parse_restart_query(raw: &str) -> Option<RestartStamp> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|millis| *millis > 0)
        .map(RestartStamp::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use screening_core::model::{AttemptAccess, AttemptStatus, ModuleId, SessionId};
    use screening_core::time::fixed_now;

    fn session(module: u32) -> ModuleSessionRef {
        ModuleSessionRef::new(ModuleId::new(module), SessionId::new(format!("s-{module}")))
    }

    fn pre_test(access: AttemptAccess) -> StageView {
        StageView {
            stage: Stage::PreTest,
            access,
        }
    }

    #[test]
    fn submit_is_claimed_once() {
        let mut vm = ModuleRunnerVm::default();
        assert!(vm.begin_submit().is_none());

        vm.apply(ModuleEntry::Running(session(1)));
        assert!(vm.can_submit());
        assert_eq!(vm.begin_submit(), Some(session(1)));
        assert!(vm.begin_submit().is_none());
        assert_eq!(vm.module_number(), Some(1));

        vm.fail();
        assert!(vm.can_submit());

        vm.begin_submit();
        vm.apply(ModuleEntry::Completed);
        assert_eq!(vm.phase(), &ModulePhase::Completed);
        assert!(!vm.can_submit());
    }

    #[test]
    fn pre_test_blocked_when_ledger_unavailable() {
        let vm = PreTestVm::from_view(&pre_test(AttemptAccess::Unavailable));
        assert!(!vm.can_start);
        assert!(vm.notice.as_ref().unwrap().contains("could not confirm"));
        assert_eq!(vm.remaining_label(), None);
    }

    #[test]
    fn pre_test_shows_remaining_attempts() {
        let status = AttemptStatus::from_ledger(1, 3, false, None, None).unwrap();
        let vm = PreTestVm::from_view(&pre_test(AttemptAccess::Known(status)));
        assert!(vm.can_start);
        assert_eq!(vm.notice, None);
        assert_eq!(vm.remaining_label().as_deref(), Some("2 attempts remaining"));
    }

    #[test]
    fn restart_query_needs_a_positive_number() {
        assert_eq!(
            parse_restart_query(" 1700000000000 "),
            Some(RestartStamp::new(1_700_000_000_000))
        );
        assert_eq!(parse_restart_query(""), None);
        assert_eq!(parse_restart_query("0"), None);
        assert_eq!(parse_restart_query("soon"), None);
    }

    #[test]
    fn flow_errors_map_to_inline_messages() {
        let blocked = FlowError::AttemptBlocked(AttemptBlock::Exhausted { max_attempts: 3 });
        assert_eq!(
            view_error_from_flow(&blocked),
            ViewError::Blocked("You have used all 3 attempts for this screening.".into())
        );
        assert_eq!(
            view_error_from_flow(&FlowError::Session(SessionError::InFlight)),
            ViewError::Busy
        );
    }

    #[test]
    fn payload_names_the_module() {
        let payload = module_payload(&session(2), fixed_now());
        assert_eq!(payload["moduleId"], 2);
        assert_eq!(payload["sessionId"], "s-2");
    }
}
