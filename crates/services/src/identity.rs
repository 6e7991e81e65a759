use tracing::warn;

use screening_core::model::ScreeningUser;
use storage::PersistentStore;

use crate::events::{EventBus, FlowEvent};

const USER_KEY: &str = "screening.user";

/// Sole owner of the persisted `ScreeningUser` record.
///
/// Every mutation is followed by `FlowEvent::UserChanged`.
#[derive(Clone)]
pub struct ScreeningIdentityStore {
    store: PersistentStore,
    events: EventBus,
}

impl ScreeningIdentityStore {
    #[must_use]
    pub fn new(store: PersistentStore, events: EventBus) -> Self {
        Self { store, events }
    }

    #[must_use]
    pub fn get_user(&self) -> Option<ScreeningUser> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, "stored screening user is unreadable, ignoring it");
                None
            }
        }
    }

    pub fn set_user(&self, user: &ScreeningUser) {
        match serde_json::to_string(user) {
            Ok(raw) => self.store.set(USER_KEY, &raw),
            Err(err) => warn!(error = %err, "screening user could not be encoded"),
        }
        self.events.publish(FlowEvent::UserChanged);
    }

    pub fn clear_user(&self) {
        self.store.remove(USER_KEY);
        self.events.publish(FlowEvent::UserChanged);
    }

    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.get_user().is_some_and(|user| user.verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screening_core::model::UserId;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user(verified: bool) -> ScreeningUser {
        ScreeningUser {
            id: UserId::new(3),
            name: "Lin".into(),
            email: "lin@example.org".into(),
            verified,
            meta: None,
        }
    }

    #[test]
    fn set_and_clear_notify_listeners() {
        let events = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = events.subscribe(move |event| {
            assert_eq!(event, FlowEvent::UserChanged);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let identity = ScreeningIdentityStore::new(PersistentStore::in_memory(), events);

        identity.set_user(&user(false));
        assert!(!identity.is_verified());
        identity.set_user(&user(true));
        assert!(identity.is_verified());
        identity.clear_user();
        assert!(identity.get_user().is_none());

        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn corrupt_record_reads_as_absent() {
        let store = PersistentStore::in_memory();
        store.set(USER_KEY, "{broken");
        let identity = ScreeningIdentityStore::new(store, EventBus::new());
        assert!(identity.get_user().is_none());
        assert!(!identity.is_verified());
    }
}
