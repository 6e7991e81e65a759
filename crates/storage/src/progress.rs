use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use screening_core::model::{FlowKey, FlowProgress, ModuleId, RestartDirective, RestartStamp};
use screening_core::time::from_millis;

use crate::persistent::PersistentStore;

/// A single stored flow value. Encoded as JSON inside the raw string store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlowValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl FlowValue {
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            FlowValue::Bool(value) => *value,
            FlowValue::Number(value) => *value != 0,
            FlowValue::Text(value) => value == "true",
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FlowValue::Number(value) => Some(*value),
            FlowValue::Text(value) => value.trim().parse().ok(),
            FlowValue::Bool(_) => None,
        }
    }

    fn encode(&self) -> String {
        match self {
            FlowValue::Bool(value) => value.to_string(),
            FlowValue::Number(value) => value.to_string(),
            FlowValue::Text(value) => {
                serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
            }
        }
    }

    fn decode(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|_| FlowValue::Text(raw.to_owned()))
    }
}

/// Typed access to the persisted flow keys.
#[derive(Clone)]
pub struct ProgressStore {
    store: PersistentStore,
}

impl ProgressStore {
    #[must_use]
    pub fn new(store: PersistentStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(PersistentStore::in_memory())
    }

    #[must_use]
    pub fn get(&self, key: FlowKey) -> Option<FlowValue> {
        self.store.get(key.as_str()).map(|raw| FlowValue::decode(&raw))
    }

    pub fn set(&self, key: FlowKey, value: FlowValue) {
        self.store.set(key.as_str(), &value.encode());
    }

    pub fn remove(&self, key: FlowKey) {
        self.store.remove(key.as_str());
    }

    /// Set each key to `false`, in order.
    pub fn reset(&self, keys: &[FlowKey]) {
        for key in keys {
            self.set(*key, FlowValue::Bool(false));
        }
    }

    #[must_use]
    pub fn flag(&self, key: FlowKey) -> bool {
        self.get(key).is_some_and(|value| value.as_bool())
    }

    pub fn set_flag(&self, key: FlowKey, value: bool) {
        debug!(key = key.as_str(), value, "flow flag updated");
        self.set(key, FlowValue::Bool(value));
    }

    #[must_use]
    pub fn progress(&self) -> FlowProgress {
        let mut progress = FlowProgress::default();
        for key in FlowKey::GATES {
            progress.set(key, self.flag(key));
        }
        progress
    }

    #[must_use]
    pub fn module_marker(&self) -> Option<ModuleId> {
        self.get(FlowKey::CurrentModuleId)
            .and_then(|value| value.as_i64())
            .and_then(|raw| u32::try_from(raw).ok())
            .filter(|raw| *raw > 0)
            .map(ModuleId::new)
    }

    pub fn set_module_marker(&self, module: ModuleId) {
        self.set(
            FlowKey::CurrentModuleId,
            FlowValue::Text(module.value().to_string()),
        );
    }

    pub fn clear_module_marker(&self) {
        self.remove(FlowKey::CurrentModuleId);
    }

    #[must_use]
    pub fn restart_directive(&self) -> Option<RestartDirective> {
        let stamp = self
            .get(FlowKey::ForceRestartFromBeginning)
            .and_then(|value| value.as_i64())
            .map(RestartStamp::new)?;
        Some(RestartDirective {
            stamp,
            needs_new_session: self.flag(FlowKey::ForceRestartNeedsNewSession),
        })
    }

    pub fn set_restart_directive(&self, directive: RestartDirective) {
        self.set(
            FlowKey::ForceRestartFromBeginning,
            FlowValue::Number(directive.stamp.millis()),
        );
        self.set(
            FlowKey::ForceRestartNeedsNewSession,
            FlowValue::Bool(directive.needs_new_session),
        );
    }

    pub fn clear_restart_directive(&self) {
        self.remove(FlowKey::ForceRestartNeedsNewSession);
        self.remove(FlowKey::ForceRestartFromBeginning);
    }

    #[must_use]
    pub fn handled_restart(&self) -> Option<RestartStamp> {
        self.get(FlowKey::RestartHandledAt)
            .and_then(|value| value.as_i64())
            .map(RestartStamp::new)
    }

    pub fn set_handled_restart(&self, stamp: RestartStamp) {
        self.set(FlowKey::RestartHandledAt, FlowValue::Number(stamp.millis()));
    }

    #[must_use]
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.get(FlowKey::LastActivityTimestamp)
            .and_then(|value| value.as_i64())
            .and_then(from_millis)
    }

    pub fn touch_activity(&self, at: DateTime<Utc>) {
        self.set(
            FlowKey::LastActivityTimestamp,
            FlowValue::Number(at.timestamp_millis()),
        );
    }

    /// Drop every flow key except the handled-restart stamp, used on sign-out.
    ///
    /// The stamp carries no user data and keeps a replayed restart link inert.
    pub fn clear_all(&self) {
        for key in [
            FlowKey::DisclaimerAccepted,
            FlowKey::FalsePositive,
            FlowKey::PreTestCompleted,
            FlowKey::QuestionerClosed,
            FlowKey::CurrentModuleId,
            FlowKey::ForceRestartFromBeginning,
            FlowKey::ForceRestartNeedsNewSession,
            FlowKey::LastActivityTimestamp,
        ] {
            self.remove(key);
        }
    }

    /// Underlying raw store, shared with the identity record.
    #[must_use]
    pub fn raw(&self) -> &PersistentStore {
        &self.store
    }
}
