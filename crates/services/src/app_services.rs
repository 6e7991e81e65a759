use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use screening_core::NavigationTrap;
use storage::{PersistentStore, ProgressStore};

use crate::Clock;
use crate::api::{ApiConfig, HttpScreeningApi, ScreeningApi};
use crate::error::AppServicesError;
use crate::events::EventBus;
use crate::exit::ExitGuardHandle;
use crate::flow::ScreeningFlowService;
use crate::identity::ScreeningIdentityStore;
use crate::registration::RegistrationService;

/// Idle period after which a running attempt is restarted.
pub const DEFAULT_IDLE_TIMEOUT_SECS: i64 = 15 * 60;

/// Wires the screening services around one store, one bus and one backend.
#[derive(Clone)]
pub struct AppServices {
    store: PersistentStore,
    events: EventBus,
    identity: ScreeningIdentityStore,
    registration: Arc<RegistrationService>,
    flow: Arc<ScreeningFlowService>,
}

impl AppServices {
    /// Build services against an already constructed backend and store.
    #[must_use]
    pub fn assemble(
        api: Arc<dyn ScreeningApi>,
        store: PersistentStore,
        trap: Arc<dyn NavigationTrap + Send + Sync>,
        clock: Clock,
        idle_timeout: Duration,
    ) -> Self {
        let events = EventBus::new();
        let identity = ScreeningIdentityStore::new(store.clone(), events.clone());
        let registration = Arc::new(RegistrationService::new(
            Arc::clone(&api),
            identity.clone(),
        ));
        let flow = Arc::new(ScreeningFlowService::new(
            api,
            ProgressStore::new(store.clone()),
            identity.clone(),
            ExitGuardHandle::new(trap),
            events.clone(),
            clock,
            idle_timeout,
        ));

        Self {
            store,
            events,
            identity,
            registration,
            flow,
        }
    }

    /// Build services backed by the HTTP backend and a profile directory.
    ///
    /// Storage problems never fail startup; the store degrades to memory.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be configured.
    pub fn new_http(
        config: ApiConfig,
        profile_dir: impl AsRef<Path>,
        trap: Arc<dyn NavigationTrap + Send + Sync>,
        clock: Clock,
        idle_timeout: Duration,
    ) -> Result<Self, AppServicesError> {
        let base_url = config.base_url.clone();
        let api = HttpScreeningApi::new(config)?;
        let store = PersistentStore::open_profile(profile_dir);
        if store.is_degraded() {
            warn!("progress will not survive a restart of the app");
        }
        info!(%base_url, "screening services ready");
        Ok(Self::assemble(
            Arc::new(api),
            store,
            trap,
            clock,
            idle_timeout,
        ))
    }

    #[must_use]
    pub fn flow(&self) -> Arc<ScreeningFlowService> {
        Arc::clone(&self.flow)
    }

    #[must_use]
    pub fn registration(&self) -> Arc<RegistrationService> {
        Arc::clone(&self.registration)
    }

    #[must_use]
    pub fn identity(&self) -> ScreeningIdentityStore {
        self.identity.clone()
    }

    #[must_use]
    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    #[must_use]
    pub fn storage_degraded(&self) -> bool {
        self.store.is_degraded()
    }
}
