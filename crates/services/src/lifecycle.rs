use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use screening_core::model::{LanguageCode, ModuleId, ModuleSessionRef, UserId};

use crate::api::{AbandonRequest, ScreeningApi, StartSessionRequest, SubmitRequest};
use crate::error::SessionError;

/// What the backend said after a module was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Next(ModuleId),
    Completed,
}

/// Released on drop, so a cancelled request frees the slot as well.
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SessionError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::InFlight)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Creates, resumes, submits and abandons remote module sessions.
///
/// At most one start/submit call runs at a time; a second concurrent call is
/// refused instead of racing to create a duplicate session.
pub struct SessionLifecycleClient {
    api: Arc<dyn ScreeningApi>,
    in_flight: AtomicBool,
    entering: AtomicBool,
    active: Mutex<Option<ModuleSessionRef>>,
}

impl SessionLifecycleClient {
    #[must_use]
    pub fn new(api: Arc<dyn ScreeningApi>) -> Self {
        Self {
            api,
            in_flight: AtomicBool::new(false),
            entering: AtomicBool::new(false),
            active: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) || self.entering.load(Ordering::Acquire)
    }

    /// Claim the module-entry slot for a whole decide/abandon/start sequence.
    ///
    /// Individual `start`/`submit` calls still take their own slot inside it.
    pub(crate) fn reserve_entry(&self) -> Result<InFlight<'_>, SessionError> {
        InFlight::acquire(&self.entering)
    }

    #[must_use]
    pub fn active(&self) -> Option<ModuleSessionRef> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_active(&self) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn set_active(&self, session: Option<ModuleSessionRef>) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Ask the backend to drop stale in-progress sessions. Never fails.
    pub async fn abandon_in_progress(&self, user_id: UserId) {
        match self.api.abandon_in_progress(&AbandonRequest { user_id }).await {
            Ok(ack) if ack.is_success => {}
            Ok(ack) => warn!(%user_id, message = %ack.message, "abandon request was refused"),
            Err(err) => warn!(%user_id, error = %err, "abandon request failed"),
        }
    }

    /// Start or resume a module session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InFlight` if another call is running and
    /// `SessionError::Api` if the backend call fails.
    pub async fn start(
        &self,
        module_id: ModuleId,
        user_id: UserId,
        language: &LanguageCode,
        resume: bool,
    ) -> Result<ModuleSessionRef, SessionError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let response = self
            .api
            .start_session(&StartSessionRequest {
                module_id,
                user_id,
                language_code: language.clone(),
                resume,
            })
            .await?;

        let session = ModuleSessionRef::new(
            response.module_id.unwrap_or(module_id),
            response.session_id,
        );
        info!(
            %user_id,
            module = %session.module_id,
            session = %session.session_id,
            resume,
            "module session started"
        );
        self.set_active(Some(session.clone()));
        Ok(session)
    }

    /// Submit the result payload of a module.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InFlight` if another call is running,
    /// `Rejected` if the backend refuses the submission and `Api` for
    /// transport failures.
    pub async fn submit(
        &self,
        session: &ModuleSessionRef,
        payload: serde_json::Value,
    ) -> Result<SubmitOutcome, SessionError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let response = self
            .api
            .submit_session(&SubmitRequest {
                module_id: session.module_id,
                session_id: session.session_id.clone(),
                payload,
            })
            .await?;
        if !response.is_success {
            return Err(SessionError::Rejected {
                message: response.message,
            });
        }

        self.set_active(None);
        match response.next_module_id {
            Some(next) if !response.assessment_completed => Ok(SubmitOutcome::Next(next)),
            _ => Ok(SubmitOutcome::Completed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryScreeningApi;

    #[tokio::test]
    async fn start_then_submit_advances_module() {
        let api = InMemoryScreeningApi::new(3, 2);
        let client = SessionLifecycleClient::new(Arc::new(api.clone()));
        let lang = LanguageCode::default();

        let session = client
            .start(ModuleId::FIRST, UserId::new(1), &lang, false)
            .await
            .unwrap();
        assert_eq!(client.active(), Some(session.clone()));

        let outcome = client
            .submit(&session, serde_json::json!({ "answers": [1, 2] }))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Next(ModuleId::new(2)));
        assert!(client.active().is_none());
        assert!(!client.is_busy());
    }

    #[tokio::test]
    async fn concurrent_start_is_refused() {
        let api = InMemoryScreeningApi::default();
        let client = SessionLifecycleClient::new(Arc::new(api.clone()));

        // Hold the slot the way a pending request would.
        let held = InFlight::acquire(&client.in_flight).unwrap();
        let err = client
            .start(ModuleId::FIRST, UserId::new(1), &LanguageCode::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InFlight));
        assert_eq!(api.sessions_created(), 0);

        drop(held);
        assert!(
            client
                .start(ModuleId::FIRST, UserId::new(1), &LanguageCode::default(), false)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn failed_start_releases_the_slot() {
        let api = InMemoryScreeningApi::default();
        api.set_offline(true);
        let client = SessionLifecycleClient::new(Arc::new(api.clone()));
        let result = client
            .start(ModuleId::FIRST, UserId::new(1), &LanguageCode::default(), false)
            .await;
        assert!(matches!(result, Err(SessionError::Api(_))));
        assert!(!client.is_busy());
        assert!(client.active().is_none());
    }

    #[tokio::test]
    async fn abandon_failure_is_swallowed() {
        let api = InMemoryScreeningApi::default();
        api.set_offline(true);
        let client = SessionLifecycleClient::new(Arc::new(api.clone()));
        client.abandon_in_progress(UserId::new(1)).await;
        assert_eq!(api.abandon_calls(), 0);
    }
}
