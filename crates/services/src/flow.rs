//! Stage-by-stage orchestration of the screening flow.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use screening_core::model::{
    AttemptAccess, AttemptBlock, FlowKey, FlowProgress, LanguageCode, ModuleId, ModuleSessionRef,
    RestartSignal, ScreeningUser,
};
use screening_core::{
    Clock, ExitDecision, ExitGuard, ForfeitWarning, InterceptOutcome, NavigationAttempt, Stage,
    StageView, StartDecision, StartInputs, decide_module_start,
};
use storage::ProgressStore;

use crate::api::ScreeningApi;
use crate::attempts::AttemptGovernor;
use crate::error::{FlowError, SessionError};
use crate::events::{EventBus, FlowEvent};
use crate::exit::ExitGuardHandle;
use crate::identity::ScreeningIdentityStore;
use crate::idle::IdleMonitor;
use crate::lifecycle::{SessionLifecycleClient, SubmitOutcome};
use crate::restart::{RestartCoordinator, RestartOutcome};

/// Where the module runner stands after a start or submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleEntry {
    Running(ModuleSessionRef),
    Completed,
}

#[derive(Clone)]
pub struct ScreeningFlowService {
    clock: Clock,
    progress: ProgressStore,
    identity: ScreeningIdentityStore,
    governor: AttemptGovernor,
    lifecycle: Arc<SessionLifecycleClient>,
    restart: RestartCoordinator,
    idle: IdleMonitor,
    exit: ExitGuardHandle,
    events: EventBus,
}

impl ScreeningFlowService {
    #[must_use]
    pub fn new(
        api: Arc<dyn ScreeningApi>,
        progress: ProgressStore,
        identity: ScreeningIdentityStore,
        exit: ExitGuardHandle,
        events: EventBus,
        clock: Clock,
        idle_timeout: Duration,
    ) -> Self {
        let restart = RestartCoordinator::new(progress.clone(), exit.clone(), events.clone());
        let idle = IdleMonitor::new(progress.clone(), idle_timeout);
        Self {
            clock,
            governor: AttemptGovernor::new(Arc::clone(&api)),
            lifecycle: Arc::new(SessionLifecycleClient::new(api)),
            progress,
            identity,
            restart,
            idle,
            exit,
            events,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &ScreeningIdentityStore {
        &self.identity
    }

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    #[must_use]
    pub fn exit_guard(&self) -> &ExitGuardHandle {
        &self.exit
    }

    #[must_use]
    pub fn idle_monitor(&self) -> &IdleMonitor {
        &self.idle
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn progress(&self) -> FlowProgress {
        self.progress.progress()
    }

    /// True while a start/submit request is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lifecycle.is_busy()
    }

    #[must_use]
    pub fn active_session(&self) -> Option<ModuleSessionRef> {
        self.lifecycle.active()
    }

    fn verified_user(&self) -> Result<ScreeningUser, FlowError> {
        let user = self.identity.get_user().ok_or(FlowError::NotRegistered)?;
        if !user.verified {
            return Err(FlowError::NotVerified);
        }
        Ok(user)
    }

    /// Derive the stage to render, refetching the ledger for verified users.
    pub async fn stage_view(&self, language: &LanguageCode) -> StageView {
        let user = self.identity.get_user();
        let access = match &user {
            Some(user) if user.verified => self.governor.check(user.id, language).await,
            _ => AttemptAccess::Unavailable,
        };
        let progress = self.progress.progress();
        let view = StageView::derive(user.as_ref(), &progress, access);

        if view.stage >= Stage::Disclaimer && ExitGuard::should_arm(&progress, &view.access) {
            self.exit.arm();
        } else {
            self.exit.disarm();
        }
        debug!(stage = ?view.stage, "stage derived");
        view
    }

    fn advance(&self, key: FlowKey) -> Result<(), FlowError> {
        self.verified_user()?;
        if !self.progress.progress().prerequisites_met(key) {
            return Err(FlowError::OutOfOrder(key));
        }
        self.progress.set_flag(key, true);
        self.idle.touch(self.clock.now());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `FlowError` if the user is not verified.
    pub fn accept_disclaimer(&self) -> Result<(), FlowError> {
        self.advance(FlowKey::DisclaimerAccepted)?;
        self.events.publish(FlowEvent::ConsentChanged);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `FlowError` if the user is not verified or the disclaimer is
    /// still open.
    pub fn acknowledge_false_positive(&self) -> Result<(), FlowError> {
        self.advance(FlowKey::FalsePositive)?;
        self.events.publish(FlowEvent::ConsentChanged);
        Ok(())
    }

    /// Finish the briefing and begin a counted attempt.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::AttemptBlocked` when the ledger refuses a new attempt
    /// or cannot be reached, and `OutOfOrder` if earlier steps are open.
    pub async fn complete_pre_test(&self, language: &LanguageCode) -> Result<(), FlowError> {
        let user = self.verified_user()?;
        if !self
            .progress
            .progress()
            .prerequisites_met(FlowKey::PreTestCompleted)
        {
            return Err(FlowError::OutOfOrder(FlowKey::PreTestCompleted));
        }

        let access = self.governor.check(user.id, language).await;
        if let Some(block) = access.block_reason() {
            info!(user_id = %user.id, ?block, "new attempt refused");
            return Err(FlowError::AttemptBlocked(block));
        }

        self.progress.set_flag(FlowKey::PreTestCompleted, true);
        self.idle.touch(self.clock.now());
        self.exit.arm();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `FlowError` if the user is not verified or the pre-test is
    /// still open.
    pub fn close_questionnaire(&self) -> Result<(), FlowError> {
        self.advance(FlowKey::QuestionerClosed)
    }

    /// Enter the module runner, resolving restart/resume/fresh-start.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::AttemptBlocked` if the ledger cannot be reached,
    /// `OutOfOrder` before the questionnaire is closed and `Session` for
    /// session failures (including a concurrent start).
    pub async fn begin_modules(&self, language: &LanguageCode) -> Result<ModuleEntry, FlowError> {
        let user = self.verified_user()?;
        // Held from the ledger read through the marker write.
        let _entry = self.lifecycle.reserve_entry()?;
        let progress = self.progress.progress();
        if !progress.questioner_closed || !progress.prerequisites_met(FlowKey::QuestionerClosed) {
            return Err(FlowError::OutOfOrder(FlowKey::QuestionerClosed));
        }

        let status = match self.governor.check(user.id, language).await {
            AttemptAccess::Known(status) => status,
            AttemptAccess::Unavailable => {
                return Err(FlowError::AttemptBlocked(AttemptBlock::LedgerUnavailable));
            }
        };

        let directive = self.progress.restart_directive();
        let decision = decide_module_start(StartInputs {
            assessment_completed: status.is_completed(),
            directive,
            local_marker: self.progress.module_marker(),
            ledger_last_completed: status.last_module_completed(),
        });
        info!(user_id = %user.id, ?decision, "module start decided");

        let session = match decision {
            StartDecision::AlreadyCompleted => {
                self.exit.disarm();
                self.progress.clear_module_marker();
                return Ok(ModuleEntry::Completed);
            }
            StartDecision::ResumeExisting(module) => {
                self.lifecycle.start(module, user.id, language, true).await?
            }
            StartDecision::ResumeFromLedger(last) => {
                self.progress.clear_module_marker();
                self.lifecycle.start(last, user.id, language, true).await?
            }
            StartDecision::StartFresh => {
                self.lifecycle.abandon_in_progress(user.id).await;
                let session = self
                    .lifecycle
                    .start(ModuleId::FIRST, user.id, language, false)
                    .await?;
                if let Some(directive) = directive {
                    self.progress
                        .set_restart_directive(directive.session_created());
                }
                session
            }
        };

        self.progress.set_module_marker(session.module_id);
        self.idle.touch(self.clock.now());
        self.exit.arm();
        Ok(ModuleEntry::Running(session))
    }

    /// Submit a module and move on to the next one.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Session` if the submission or the follow-up start
    /// fails; the local marker then points at the module to retry.
    pub async fn submit_module(
        &self,
        session: &ModuleSessionRef,
        payload: serde_json::Value,
        language: &LanguageCode,
    ) -> Result<ModuleEntry, FlowError> {
        let user = self.verified_user()?;
        let _entry = self.lifecycle.reserve_entry()?;
        let outcome = self.lifecycle.submit(session, payload).await?;
        if session.module_id.is_first() {
            self.progress.clear_restart_directive();
        }
        self.idle.touch(self.clock.now());

        match outcome {
            SubmitOutcome::Next(next) => {
                self.progress.set_module_marker(next);
                let started = self.lifecycle.start(next, user.id, language, false).await?;
                Ok(ModuleEntry::Running(started))
            }
            SubmitOutcome::Completed => {
                info!(user_id = %user.id, "assessment completed");
                self.exit.disarm();
                self.progress.clear_module_marker();
                Ok(ModuleEntry::Completed)
            }
        }
    }

    /// Submit `payload` for whichever module session is currently open.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` (wrapped) when nothing is open,
    /// otherwise the same errors as [`Self::submit_module`].
    pub async fn submit_active(
        &self,
        payload: serde_json::Value,
        language: &LanguageCode,
    ) -> Result<ModuleEntry, FlowError> {
        let session = self
            .lifecycle
            .active()
            .ok_or(SessionError::NoActiveSession)?;
        self.submit_module(&session, payload, language).await
    }

    /// Apply a restart request coming from navigation state or the idle timer.
    pub fn apply_restart(&self, signal: RestartSignal) -> RestartOutcome {
        let outcome = self.restart.apply(signal);
        if outcome == RestartOutcome::Applied {
            self.lifecycle.clear_active();
        }
        outcome
    }

    pub fn record_activity(&self) {
        self.idle.touch(self.clock.now());
    }

    /// Poll the idle clock and restart if it has run out.
    pub fn check_idle(&self) -> Option<RestartOutcome> {
        self.idle
            .poll(self.clock.now())
            .map(|signal| self.apply_restart(signal))
    }

    #[must_use]
    pub fn intercept_navigation(&self, attempt: NavigationAttempt) -> InterceptOutcome {
        self.exit.intercept(attempt)
    }

    pub fn stay_on_assessment(&self) {
        self.exit.stay();
        self.record_activity();
    }

    /// Confirm leaving from the forfeiture dialog.
    #[must_use]
    pub fn confirm_exit(&self) -> ExitDecision {
        let decision = self.exit.confirm_exit();
        if decision == ExitDecision::Leave {
            self.lifecycle.clear_active();
            info!("assessment left mid-attempt, ledger will count it");
        }
        decision
    }

    /// Warning text for the forfeiture dialog, using a fresh ledger answer.
    pub async fn forfeit_warning(&self, language: &LanguageCode) -> ForfeitWarning {
        match self.identity.get_user() {
            Some(user) => ForfeitWarning::from_access(&self.governor.check(user.id, language).await),
            None => ForfeitWarning {
                remaining_attempts: None,
            },
        }
    }

    /// Forget the user and all local progress.
    pub fn sign_out(&self) {
        self.exit.disarm();
        self.lifecycle.clear_active();
        self.progress.clear_all();
        self.identity.clear_user();
        self.events.publish(FlowEvent::ConsentChanged);
        if self.progress.raw().is_degraded() {
            warn!("signed out while storage is degraded; progress was memory-only");
        }
    }
}
