use std::sync::Arc;
use std::time::Duration;

use screening_core::model::LanguageCode;
use services::{EventBus, RegistrationService, ScreeningFlowService};

use crate::platform::WebviewTrap;

pub trait UiApp: Send + Sync {
    fn flow(&self) -> Arc<ScreeningFlowService>;
    fn registration(&self) -> Arc<RegistrationService>;
    fn navigation_trap(&self) -> Arc<WebviewTrap>;
    fn language(&self) -> LanguageCode;

    /// How often the idle clock is checked while an attempt is running.
    fn idle_poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }
}

#[derive(Clone)]
pub struct AppContext {
    language: LanguageCode,
    idle_poll_interval: Duration,

    flow: Arc<ScreeningFlowService>,
    registration: Arc<RegistrationService>,
    navigation_trap: Arc<WebviewTrap>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            language: app.language(),
            idle_poll_interval: app.idle_poll_interval(),
            flow: app.flow(),
            registration: app.registration(),
            navigation_trap: app.navigation_trap(),
        }
    }

    #[must_use]
    pub fn language(&self) -> LanguageCode {
        self.language.clone()
    }

    #[must_use]
    pub fn idle_poll_interval(&self) -> Duration {
        self.idle_poll_interval
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
    pub fn navigation_trap(&self) -> Arc<WebviewTrap> {
        Arc::clone(&self.navigation_trap)
    }

    #[must_use]
    pub fn events(&self) -> EventBus {
        self.flow.events().clone()
    }
}

// Provided by the application composition root (`crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
