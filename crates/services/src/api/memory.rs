use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::StatusCode;

use screening_core::model::{ModuleId, ScreeningUser, SessionId, UserId};

use crate::api::{
    AbandonRequest, AckResponse, AttemptStatusRequest, AttemptStatusResponse, ModuleRef,
    RegisterRequest, RegisterResponse, ScreeningApi, StartSessionRequest, StartSessionResponse,
    SubmitRequest, SubmitResponse, VerifyEmailRequest, VerifyEmailResponse,
};
use crate::error::ApiError;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_MODULE_COUNT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    InProgress,
    Submitted,
    Abandoned,
}

#[derive(Debug, Clone)]
struct SessionRecord {
    user_id: UserId,
    module_id: ModuleId,
    state: SessionState,
}

#[derive(Debug, Clone, Default)]
struct LedgerEntry {
    count: u32,
    completed: bool,
    last_completed: Option<ModuleId>,
}

#[derive(Debug, Default)]
struct Backend {
    next_user: u64,
    next_session: u64,
    users: HashMap<UserId, ScreeningUser>,
    tokens: HashMap<String, UserId>,
    ledger: HashMap<UserId, LedgerEntry>,
    sessions: HashMap<SessionId, SessionRecord>,
    sessions_created: usize,
    abandon_calls: usize,
    offline: bool,
}

/// Self-contained backend simulation for tests and offline runs.
///
/// Tracks users, verification tokens, the attempt ledger and module sessions
/// the way the remote service does.
#[derive(Clone)]
pub struct InMemoryScreeningApi {
    inner: Arc<Mutex<Backend>>,
    max_attempts: u32,
    module_count: u32,
}

impl Default for InMemoryScreeningApi {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_MODULE_COUNT)
    }
}

impl InMemoryScreeningApi {
    #[must_use]
    pub fn new(max_attempts: u32, module_count: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Backend::default())),
            max_attempts,
            module_count: module_count.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn online(&self) -> Result<MutexGuard<'_, Backend>, ApiError> {
        let guard = self.lock();
        if guard.offline {
            return Err(ApiError::Unavailable("backend offline".into()));
        }
        Ok(guard)
    }

    /// Make every call fail with `ApiError::Unavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Verification token mailed to `email`, if registered.
    #[must_use]
    pub fn verification_token(&self, email: &str) -> Option<String> {
        let guard = self.lock();
        let user_id = guard
            .users
            .values()
            .find(|user| user.email == email)
            .map(|user| user.id)?;
        guard
            .tokens
            .iter()
            .find(|(_, id)| **id == user_id)
            .map(|(token, _)| token.clone())
    }

    /// Overwrite a user's ledger entry.
    pub fn seed_ledger(
        &self,
        user_id: UserId,
        count: u32,
        completed: bool,
        last_completed: Option<ModuleId>,
    ) {
        self.lock().ledger.insert(
            user_id,
            LedgerEntry {
                count,
                completed,
                last_completed,
            },
        );
    }

    /// Number of brand-new remote sessions created so far.
    #[must_use]
    pub fn sessions_created(&self) -> usize {
        self.lock().sessions_created
    }

    #[must_use]
    pub fn abandon_calls(&self) -> usize {
        self.lock().abandon_calls
    }

    #[must_use]
    pub fn in_progress_sessions(&self, user_id: UserId) -> usize {
        self.lock()
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && s.state == SessionState::InProgress)
            .count()
    }

    fn create_session(backend: &mut Backend, user_id: UserId, module_id: ModuleId) -> SessionId {
        backend.next_session += 1;
        backend.sessions_created += 1;
        let session_id = SessionId::new(format!("session-{}", backend.next_session));
        backend.sessions.insert(
            session_id.clone(),
            SessionRecord {
                user_id,
                module_id,
                state: SessionState::InProgress,
            },
        );
        session_id
    }
}

#[async_trait]
impl ScreeningApi for InMemoryScreeningApi {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let mut backend = self.online()?;
        if backend.users.values().any(|user| user.email == request.email) {
            return Ok(RegisterResponse {
                is_success: false,
                message: "This email address is already registered.".into(),
                user_id: None,
            });
        }

        backend.next_user += 1;
        let id = UserId::new(backend.next_user);
        backend.users.insert(
            id,
            ScreeningUser {
                id,
                name: request.name.clone(),
                email: request.email.clone(),
                verified: false,
                meta: None,
            },
        );
        backend.tokens.insert(format!("verify-{id}"), id);

        Ok(RegisterResponse {
            is_success: true,
            message: "Check your inbox to verify your email address.".into(),
            user_id: Some(id),
        })
    }

    async fn verify_email(
        &self,
        request: &VerifyEmailRequest,
    ) -> Result<VerifyEmailResponse, ApiError> {
        let mut backend = self.online()?;
        let Some(id) = backend.tokens.get(&request.token).copied() else {
            return Ok(VerifyEmailResponse {
                is_success: false,
                message: "This verification link is invalid or has expired.".into(),
                user: None,
            });
        };
        let user = backend.users.get_mut(&id).map(|user| {
            user.verified = true;
            user.clone()
        });
        Ok(VerifyEmailResponse {
            is_success: user.is_some(),
            message: "Email verified.".into(),
            user,
        })
    }

    async fn attempt_status(
        &self,
        request: &AttemptStatusRequest,
    ) -> Result<AttemptStatusResponse, ApiError> {
        let backend = self.online()?;
        let entry = backend
            .ledger
            .get(&request.user_id)
            .cloned()
            .unwrap_or_default();
        Ok(AttemptStatusResponse {
            allowed: entry.count < self.max_attempts && !entry.completed,
            is_completed: entry.completed,
            count: entry.count,
            max_attempts: self.max_attempts,
            last_module_completed: entry.last_completed.map(|id| ModuleRef { id }),
            completion_message: entry
                .completed
                .then(|| "Thank you. Your screening results are on their way.".to_owned()),
        })
    }

    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError> {
        let mut backend = self.online()?;
        let max_attempts = self.max_attempts;
        let entry = backend.ledger.entry(request.user_id).or_default();
        if entry.completed {
            return Err(ApiError::HttpStatus(StatusCode::CONFLICT));
        }

        let module_id = if request.resume {
            match entry.last_completed {
                Some(last) if last == request.module_id => last.next(),
                _ => request.module_id,
            }
        } else {
            if request.module_id.is_first() {
                if entry.count >= max_attempts {
                    return Err(ApiError::HttpStatus(StatusCode::FORBIDDEN));
                }
                entry.count += 1;
                entry.last_completed = None;
            }
            request.module_id
        };

        let existing = request.resume.then(|| {
            backend
                .sessions
                .iter()
                .find(|(_, s)| {
                    s.user_id == request.user_id
                        && s.module_id == module_id
                        && s.state == SessionState::InProgress
                })
                .map(|(id, _)| id.clone())
        });
        let session_id = match existing.flatten() {
            Some(id) => id,
            None => Self::create_session(&mut backend, request.user_id, module_id),
        };

        Ok(StartSessionResponse {
            session_id,
            module_id: Some(module_id),
            extra: serde_json::Map::new(),
        })
    }

    async fn submit_session(&self, request: &SubmitRequest) -> Result<SubmitResponse, ApiError> {
        let mut backend = self.online()?;
        let Some(record) = backend.sessions.get_mut(&request.session_id) else {
            return Err(ApiError::HttpStatus(StatusCode::NOT_FOUND));
        };
        if record.state != SessionState::InProgress || record.module_id != request.module_id {
            return Ok(SubmitResponse {
                is_success: false,
                message: "This module session is no longer active.".into(),
                next_module_id: None,
                assessment_completed: false,
            });
        }
        record.state = SessionState::Submitted;
        let user_id = record.user_id;

        let finished = request.module_id.value() >= self.module_count;
        let entry = backend.ledger.entry(user_id).or_default();
        entry.last_completed = Some(request.module_id);
        entry.completed = finished;

        Ok(SubmitResponse {
            is_success: true,
            message: String::new(),
            next_module_id: (!finished).then(|| request.module_id.next()),
            assessment_completed: finished,
        })
    }

    async fn abandon_in_progress(&self, request: &AbandonRequest) -> Result<AckResponse, ApiError> {
        let mut backend = self.online()?;
        backend.abandon_calls += 1;
        for session in backend.sessions.values_mut() {
            if session.user_id == request.user_id && session.state == SessionState::InProgress {
                session.state = SessionState::Abandoned;
            }
        }
        Ok(AckResponse {
            is_success: true,
            message: String::new(),
        })
    }
}
