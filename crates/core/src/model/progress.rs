use serde::{Deserialize, Serialize};

/// Persisted keys that make up the flow's local state.
///
/// The string form is the storage key; it is part of the on-disk format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKey {
    QuestionerClosed,
    DisclaimerAccepted,
    FalsePositive,
    PreTestCompleted,
    CurrentModuleId,
    ForceRestartFromBeginning,
    ForceRestartNeedsNewSession,
    LastActivityTimestamp,
    RestartHandledAt,
}

impl FlowKey {
    /// The four stage gates, in pipeline order.
    pub const GATES: [FlowKey; 4] = [
        FlowKey::DisclaimerAccepted,
        FlowKey::FalsePositive,
        FlowKey::PreTestCompleted,
        FlowKey::QuestionerClosed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FlowKey::QuestionerClosed => "flow.questionerClosed",
            FlowKey::DisclaimerAccepted => "flow.disclaimerAccepted",
            FlowKey::FalsePositive => "flow.falsePositive",
            FlowKey::PreTestCompleted => "flow.preTestCompleted",
            FlowKey::CurrentModuleId => "flow.currentModuleId",
            FlowKey::ForceRestartFromBeginning => "flow.forceRestartFromBeginning",
            FlowKey::ForceRestartNeedsNewSession => "flow.forceRestartNeedsNewSession",
            FlowKey::LastActivityTimestamp => "flow.lastActivityTimestamp",
            FlowKey::RestartHandledAt => "flow.restartHandledAt",
        }
    }

    #[must_use]
    pub const fn is_gate(self) -> bool {
        matches!(
            self,
            FlowKey::QuestionerClosed
                | FlowKey::DisclaimerAccepted
                | FlowKey::FalsePositive
                | FlowKey::PreTestCompleted
        )
    }
}

/// Boolean gates describing how far the user has advanced.
///
/// Gates unlock left to right. The only way back is a restart, which clears
/// all four at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowProgress {
    pub disclaimer_accepted: bool,
    pub false_positive_acknowledged: bool,
    pub pre_test_completed: bool,
    pub questioner_closed: bool,
}

impl FlowProgress {
    #[must_use]
    pub fn get(&self, key: FlowKey) -> bool {
        match key {
            FlowKey::DisclaimerAccepted => self.disclaimer_accepted,
            FlowKey::FalsePositive => self.false_positive_acknowledged,
            FlowKey::PreTestCompleted => self.pre_test_completed,
            FlowKey::QuestionerClosed => self.questioner_closed,
            _ => false,
        }
    }

    pub fn set(&mut self, key: FlowKey, value: bool) {
        match key {
            FlowKey::DisclaimerAccepted => self.disclaimer_accepted = value,
            FlowKey::FalsePositive => self.false_positive_acknowledged = value,
            FlowKey::PreTestCompleted => self.pre_test_completed = value,
            FlowKey::QuestionerClosed => self.questioner_closed = value,
            _ => {}
        }
    }

    /// True when every gate before `key` is already open.
    #[must_use]
    pub fn prerequisites_met(&self, key: FlowKey) -> bool {
        FlowKey::GATES
            .iter()
            .take_while(|gate| **gate != key)
            .all(|gate| self.get(*gate))
    }

    /// True once the user is past the pre-test briefing and the attempt counts.
    #[must_use]
    pub fn assessment_underway(&self) -> bool {
        self.pre_test_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_closed() {
        let progress = FlowProgress::default();
        assert!(FlowKey::GATES.iter().all(|key| !progress.get(*key)));
    }

    #[test]
    fn prerequisites_follow_gate_order() {
        let mut progress = FlowProgress::default();
        assert!(progress.prerequisites_met(FlowKey::DisclaimerAccepted));
        assert!(!progress.prerequisites_met(FlowKey::FalsePositive));

        progress.set(FlowKey::DisclaimerAccepted, true);
        progress.set(FlowKey::FalsePositive, true);
        assert!(progress.prerequisites_met(FlowKey::PreTestCompleted));
        assert!(!progress.prerequisites_met(FlowKey::QuestionerClosed));
    }

    #[test]
    fn non_gate_keys_are_ignored() {
        let mut progress = FlowProgress::default();
        progress.set(FlowKey::CurrentModuleId, true);
        assert_eq!(progress, FlowProgress::default());
        assert!(!FlowKey::CurrentModuleId.is_gate());
    }
}
