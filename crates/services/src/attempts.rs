use std::sync::Arc;

use tracing::{debug, warn};

use screening_core::model::{AttemptAccess, AttemptStatus, LanguageCode, UserId};

use crate::api::{AttemptStatusRequest, ScreeningApi};
use crate::error::AttemptError;

/// Reads the remote attempt ledger. Nothing is cached between calls.
#[derive(Clone)]
pub struct AttemptGovernor {
    api: Arc<dyn ScreeningApi>,
}

impl AttemptGovernor {
    #[must_use]
    pub fn new(api: Arc<dyn ScreeningApi>) -> Self {
        Self { api }
    }

    /// Fetch the authoritative attempt status.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Api` if the ledger cannot be reached and
    /// `AttemptError::Ledger` if it reports an impossible count.
    pub async fn fetch_status(
        &self,
        user_id: UserId,
        language: &LanguageCode,
    ) -> Result<AttemptStatus, AttemptError> {
        let response = self
            .api
            .attempt_status(&AttemptStatusRequest {
                user_id,
                language_code: language.clone(),
            })
            .await?;

        let status = AttemptStatus::from_ledger(
            response.count,
            response.max_attempts,
            response.is_completed,
            response.last_module_completed.map(|module| module.id),
            response.completion_message,
        )?;

        if status.allowed() != response.allowed {
            debug!(
                %user_id,
                remote = response.allowed,
                derived = status.allowed(),
                "ledger allowed flag disagrees with its counts, using counts"
            );
        }
        Ok(status)
    }

    /// Fail-closed variant: any failure means no new attempt may start.
    pub async fn check(&self, user_id: UserId, language: &LanguageCode) -> AttemptAccess {
        match self.fetch_status(user_id, language).await {
            Ok(status) => AttemptAccess::Known(status),
            Err(err) => {
                warn!(%user_id, error = %err, "attempt ledger unavailable, blocking new attempts");
                AttemptAccess::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryScreeningApi;
    use screening_core::model::ModuleId;

    fn governor(api: &InMemoryScreeningApi) -> AttemptGovernor {
        AttemptGovernor::new(Arc::new(api.clone()))
    }

    #[tokio::test]
    async fn exhausted_ledger_is_not_allowed() {
        let api = InMemoryScreeningApi::new(3, 4);
        api.seed_ledger(UserId::new(1), 3, false, None);
        let status = governor(&api)
            .fetch_status(UserId::new(1), &LanguageCode::default())
            .await
            .unwrap();
        assert!(!status.allowed());
        assert_eq!(status.count(), 3);
        assert_eq!(status.max_attempts(), 3);
    }

    #[tokio::test]
    async fn completion_wins_over_remaining_attempts() {
        let api = InMemoryScreeningApi::new(3, 4);
        api.seed_ledger(UserId::new(1), 1, true, Some(ModuleId::new(4)));
        let access = governor(&api)
            .check(UserId::new(1), &LanguageCode::default())
            .await;
        assert!(access.is_completed());
        assert!(!access.allows_new_attempt());
    }

    #[tokio::test]
    async fn unreachable_ledger_fails_closed() {
        let api = InMemoryScreeningApi::default();
        api.set_offline(true);
        let access = governor(&api)
            .check(UserId::new(1), &LanguageCode::default())
            .await;
        assert_eq!(access, AttemptAccess::Unavailable);
        assert!(!access.allows_new_attempt());
    }

    #[tokio::test]
    async fn impossible_count_fails_closed() {
        let api = InMemoryScreeningApi::new(3, 4);
        api.seed_ledger(UserId::new(1), 5, false, None);
        let gov = governor(&api);
        assert!(matches!(
            gov.fetch_status(UserId::new(1), &LanguageCode::default()).await,
            Err(AttemptError::Ledger(_))
        ));
        assert_eq!(
            gov.check(UserId::new(1), &LanguageCode::default()).await,
            AttemptAccess::Unavailable
        );
    }
}
