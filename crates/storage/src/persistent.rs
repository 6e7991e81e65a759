use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::file::FileStore;
use crate::kv::{InMemoryStore, KeyValueStore};

enum Backend {
    Primary(Arc<dyn KeyValueStore>),
    Degraded(InMemoryStore),
}

/// Infallible facade over a `KeyValueStore`.
///
/// The first backend error switches the process to an in-memory copy of what
/// was readable at that point. Callers never see storage errors.
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<Mutex<Backend>>,
}

impl PersistentStore {
    #[must_use]
    pub fn new(primary: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend: Arc::new(Mutex::new(Backend::Primary(primary))),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    /// Open a file store in `profile_dir`, or start degraded if that fails.
    #[must_use]
    pub fn open_profile(profile_dir: impl AsRef<Path>) -> Self {
        let dir = profile_dir.as_ref();
        match FileStore::open(dir) {
            Ok(store) => Self::new(Arc::new(store)),
            Err(err) => {
                warn!(
                    profile = %dir.display(),
                    error = %err,
                    "profile storage unavailable, keeping progress in memory"
                );
                Self {
                    backend: Arc::new(Mutex::new(Backend::Degraded(InMemoryStore::new()))),
                }
            }
        }
    }

    /// True once the store has fallen back to memory.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        let guard = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*guard, Backend::Degraded(_))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.with_backend(key, |store| store.get(key)).flatten()
    }

    pub fn set(&self, key: &str, value: &str) {
        let _ = self.with_backend(key, |store| store.set(key, value));
    }

    pub fn remove(&self, key: &str) {
        let _ = self.with_backend(key, |store| store.remove(key));
    }

    fn with_backend<T>(
        &self,
        key: &str,
        op: impl Fn(&dyn KeyValueStore) -> Result<T, crate::kv::StorageError>,
    ) -> Option<T> {
        let mut guard = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
        let primary = match &*guard {
            Backend::Degraded(memory) => return op(memory).ok(),
            Backend::Primary(primary) => Arc::clone(primary),
        };

        match op(primary.as_ref()) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    key,
                    error = %err,
                    "storage write-through failed, degrading to in-memory store"
                );
                let seed = primary.snapshot().unwrap_or_default();
                let memory = InMemoryStore::seeded(seed);
                let retried = op(&memory).ok();
                *guard = Backend::Degraded(memory);
                retried
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::StorageError;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Backend that starts failing writes once `broken` is flipped.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryStore,
        broken: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("quota exceeded".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }

        fn snapshot(&self) -> Result<BTreeMap<String, String>, StorageError> {
            self.inner.snapshot()
        }
    }

    #[test]
    fn degrades_to_memory_and_keeps_existing_values() {
        let flaky = Arc::new(FlakyStore::default());
        let store = PersistentStore::new(flaky.clone());
        store.set("flow.disclaimerAccepted", "true");
        assert!(!store.is_degraded());

        flaky.broken.store(true, Ordering::SeqCst);
        store.set("flow.falsePositive", "true");

        assert!(store.is_degraded());
        assert_eq!(store.get("flow.disclaimerAccepted").as_deref(), Some("true"));
        assert_eq!(store.get("flow.falsePositive").as_deref(), Some("true"));

        flaky.broken.store(false, Ordering::SeqCst);
        store.set("flow.preTestCompleted", "true");
        assert!(flaky.inner.get("flow.preTestCompleted").unwrap().is_none());
    }

    #[test]
    fn unopenable_profile_starts_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let store = PersistentStore::open_profile(&blocker);
        assert!(store.is_degraded());
        store.set("screening.user", "{}");
        assert_eq!(store.get("screening.user").as_deref(), Some("{}"));
    }
}
