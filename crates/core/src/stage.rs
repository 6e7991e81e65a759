//! Stage sequencing for the screening pipeline.
//!
//! The active stage is never stored. It is recomputed from the persisted gates,
//! the identity record and the latest ledger answer every time it is needed.

use crate::model::{AttemptAccess, FlowProgress, ScreeningUser};

/// One screen of the fixed pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Unverified,
    AwaitingVerification,
    Disclaimer,
    FalsePositive,
    PreTest,
    Questionnaire,
    ModuleRunner,
    Completed,
}

impl Stage {
    /// Stages during which leaving forfeits the counted attempt.
    #[must_use]
    pub fn is_guarded(self) -> bool {
        matches!(self, Stage::Questionnaire | Stage::ModuleRunner)
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Stage::Unverified => "Register",
            Stage::AwaitingVerification => "Check your email",
            Stage::Disclaimer => "Consent",
            Stage::FalsePositive => "Before you begin",
            Stage::PreTest => "Pre-test briefing",
            Stage::Questionnaire => "Questionnaire",
            Stage::ModuleRunner => "Cognitive modules",
            Stage::Completed => "Completed",
        }
    }
}

/// Pick the single stage to render.
///
/// Scans left to right and stops at the first unmet prerequisite. A verified
/// user whose ledger reports completion always lands on `Completed`.
#[must_use]
pub fn derive_stage(
    user: Option<&ScreeningUser>,
    progress: &FlowProgress,
    access: &AttemptAccess,
) -> Stage {
    let Some(user) = user else {
        return Stage::Unverified;
    };
    if !user.verified {
        return Stage::AwaitingVerification;
    }
    if access.is_completed() {
        return Stage::Completed;
    }

    if !progress.disclaimer_accepted {
        Stage::Disclaimer
    } else if !progress.false_positive_acknowledged {
        Stage::FalsePositive
    } else if !progress.pre_test_completed {
        Stage::PreTest
    } else if !progress.questioner_closed {
        Stage::Questionnaire
    } else {
        Stage::ModuleRunner
    }
}

/// Stage plus the ledger answer it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub stage: Stage,
    pub access: AttemptAccess,
}

impl StageView {
    #[must_use]
    pub fn derive(
        user: Option<&ScreeningUser>,
        progress: &FlowProgress,
        access: AttemptAccess,
    ) -> Self {
        let stage = derive_stage(user, progress, &access);
        Self { stage, access }
    }

    /// Whether the pre-test "Start" action may be offered.
    #[must_use]
    pub fn can_start_attempt(&self) -> bool {
        self.stage == Stage::PreTest && self.access.allows_new_attempt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttemptStatus, UserId};

    fn user(verified: bool) -> ScreeningUser {
        ScreeningUser {
            id: UserId::new(1),
            name: "Ada".into(),
            email: "ada@example.org".into(),
            verified,
            meta: None,
        }
    }

    fn open(count: u32, max: u32) -> AttemptAccess {
        AttemptAccess::Known(AttemptStatus::from_ledger(count, max, false, None, None).unwrap())
    }

    fn all_gates() -> FlowProgress {
        FlowProgress {
            disclaimer_accepted: true,
            false_positive_acknowledged: true,
            pre_test_completed: true,
            questioner_closed: true,
        }
    }

    #[test]
    fn no_user_is_unverified() {
        assert_eq!(
            derive_stage(None, &all_gates(), &open(0, 3)),
            Stage::Unverified
        );
    }

    #[test]
    fn unverified_user_waits_for_verification_regardless_of_flags() {
        let completed =
            AttemptAccess::Known(AttemptStatus::from_ledger(1, 3, true, None, None).unwrap());
        for access in [open(0, 3), completed, AttemptAccess::Unavailable] {
            assert_eq!(
                derive_stage(Some(&user(false)), &all_gates(), &access),
                Stage::AwaitingVerification
            );
        }
    }

    #[test]
    fn stages_unlock_left_to_right() {
        let u = user(true);
        let mut progress = FlowProgress::default();
        assert_eq!(derive_stage(Some(&u), &progress, &open(0, 3)), Stage::Disclaimer);

        progress.disclaimer_accepted = true;
        assert_eq!(derive_stage(Some(&u), &progress, &open(0, 3)), Stage::FalsePositive);

        progress.false_positive_acknowledged = true;
        assert_eq!(derive_stage(Some(&u), &progress, &open(0, 3)), Stage::PreTest);

        progress.pre_test_completed = true;
        assert_eq!(derive_stage(Some(&u), &progress, &open(1, 3)), Stage::Questionnaire);

        progress.questioner_closed = true;
        assert_eq!(derive_stage(Some(&u), &progress, &open(1, 3)), Stage::ModuleRunner);
    }

    #[test]
    fn later_gate_without_earlier_one_stays_on_earlier_stage() {
        let progress = FlowProgress {
            pre_test_completed: true,
            ..FlowProgress::default()
        };
        assert_eq!(
            derive_stage(Some(&user(true)), &progress, &open(0, 3)),
            Stage::Disclaimer
        );
    }

    #[test]
    fn completion_overrides_remaining_attempts() {
        let progress = FlowProgress {
            disclaimer_accepted: true,
            false_positive_acknowledged: true,
            ..FlowProgress::default()
        };
        let access =
            AttemptAccess::Known(AttemptStatus::from_ledger(1, 3, true, None, None).unwrap());
        let view = StageView::derive(Some(&user(true)), &progress, access);
        assert_eq!(view.stage, Stage::Completed);
        assert!(!view.can_start_attempt());
    }

    #[test]
    fn pre_test_start_requires_ledger_permission() {
        let progress = FlowProgress {
            disclaimer_accepted: true,
            false_positive_acknowledged: true,
            ..FlowProgress::default()
        };
        let u = user(true);
        assert!(StageView::derive(Some(&u), &progress, open(2, 3)).can_start_attempt());
        assert!(!StageView::derive(Some(&u), &progress, open(3, 3)).can_start_attempt());
        let blocked = StageView::derive(Some(&u), &progress, AttemptAccess::Unavailable);
        assert_eq!(blocked.stage, Stage::PreTest);
        assert!(!blocked.can_start_attempt());
    }
}
