use std::sync::Arc;

use tracing::{info, warn};

use screening_core::model::{RegistrationDraft, ScreeningUser};

use crate::api::{RegisterRequest, ScreeningApi, VerifyEmailRequest};
use crate::error::RegistrationError;
use crate::identity::ScreeningIdentityStore;

/// Registration and email-verification glue in front of the identity store.
#[derive(Clone)]
pub struct RegistrationService {
    api: Arc<dyn ScreeningApi>,
    identity: ScreeningIdentityStore,
}

impl RegistrationService {
    #[must_use]
    pub fn new(api: Arc<dyn ScreeningApi>, identity: ScreeningIdentityStore) -> Self {
        Self { api, identity }
    }

    /// Register a new screening user. The stored user starts unverified.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::Invalid` before any request if the draft is
    /// invalid, `Rejected` with the server message if the backend refuses, and
    /// `Api` for transport failures.
    pub async fn register(
        &self,
        draft: RegistrationDraft,
    ) -> Result<ScreeningUser, RegistrationError> {
        let registration = draft.validate()?;
        let request = RegisterRequest {
            name: registration.name().to_owned(),
            email: registration.email().to_owned(),
            age: registration.age(),
        };

        let response = self.api.register(&request).await.inspect_err(|err| {
            warn!(error = %err, "registration request failed");
        })?;
        if !response.is_success {
            return Err(RegistrationError::Rejected {
                message: response.message,
            });
        }
        let id = response.user_id.ok_or(RegistrationError::MissingUserId)?;

        let user = ScreeningUser::unverified(id, &registration);
        self.identity.set_user(&user);
        info!(user_id = %id, "screening user registered, awaiting verification");
        Ok(user)
    }

    /// Consume a verification token from the emailed link.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::EmptyToken` for a blank token, `Rejected`
    /// if the backend refuses it, `NoPendingUser` if neither the response nor
    /// the local store has a user to mark verified, and `Api` for transport
    /// failures.
    pub async fn verify(&self, token: &str) -> Result<ScreeningUser, RegistrationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(RegistrationError::EmptyToken);
        }

        let response = self
            .api
            .verify_email(&VerifyEmailRequest {
                token: token.to_owned(),
            })
            .await
            .inspect_err(|err| warn!(error = %err, "verification request failed"))?;
        if !response.is_success {
            return Err(RegistrationError::Rejected {
                message: response.message,
            });
        }

        let user = response
            .user
            .or_else(|| self.identity.get_user())
            .ok_or(RegistrationError::NoPendingUser)?
            .into_verified();
        self.identity.set_user(&user);
        info!(user_id = %user.id, "screening user verified");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryScreeningApi;
    use crate::events::EventBus;
    use storage::PersistentStore;

    fn service(api: &InMemoryScreeningApi) -> (RegistrationService, ScreeningIdentityStore) {
        let identity = ScreeningIdentityStore::new(PersistentStore::in_memory(), EventBus::new());
        let api: Arc<dyn ScreeningApi> = Arc::new(api.clone());
        (RegistrationService::new(api, identity.clone()), identity)
    }

    fn draft(email: &str) -> RegistrationDraft {
        RegistrationDraft {
            name: "Ada".into(),
            email: email.into(),
            age: 40,
        }
    }

    #[tokio::test]
    async fn register_then_verify() {
        let api = InMemoryScreeningApi::default();
        let (svc, identity) = service(&api);

        let user = svc.register(draft("ada@example.org")).await.unwrap();
        assert!(!user.verified);
        assert_eq!(identity.get_user(), Some(user.clone()));

        let token = api.verification_token("ada@example.org").unwrap();
        let verified = svc.verify(&token).await.unwrap();
        assert!(verified.verified);
        assert!(identity.is_verified());
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_backend() {
        let api = InMemoryScreeningApi::default();
        api.set_offline(true);
        let (svc, _) = service(&api);
        let err = svc.register(draft("nope")).await.unwrap_err();
        assert!(matches!(err, RegistrationError::Invalid(_)));
    }

    #[tokio::test]
    async fn duplicate_email_surfaces_server_message() {
        let api = InMemoryScreeningApi::default();
        let (svc, _) = service(&api);
        svc.register(draft("ada@example.org")).await.unwrap();
        let err = svc.register(draft("ada@example.org")).await.unwrap_err();
        assert!(err.user_message().contains("already registered"), "{err}");
    }

    #[tokio::test]
    async fn bad_token_leaves_user_unverified() {
        let api = InMemoryScreeningApi::default();
        let (svc, identity) = service(&api);
        svc.register(draft("ada@example.org")).await.unwrap();

        let err = svc.verify("verify-999").await.unwrap_err();
        assert!(matches!(err, RegistrationError::Rejected { .. }));
        assert!(!identity.is_verified());
        assert!(matches!(
            svc.verify("   ").await,
            Err(RegistrationError::EmptyToken)
        ));
    }
}
