#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod attempts;
pub mod error;
pub mod events;
pub mod exit;
pub mod flow;
pub mod identity;
pub mod idle;
pub mod lifecycle;
pub mod registration;
pub mod restart;

pub use screening_core::Clock;

pub use api::{ApiConfig, HttpScreeningApi, InMemoryScreeningApi, ScreeningApi};
pub use app_services::{AppServices, DEFAULT_IDLE_TIMEOUT_SECS};
pub use attempts::AttemptGovernor;
pub use error::{
    ApiError, AppServicesError, AttemptError, FlowError, RegistrationError, SessionError,
};
pub use events::{EventBus, FlowEvent, Subscription};
pub use exit::ExitGuardHandle;
pub use flow::{ModuleEntry, ScreeningFlowService};
pub use identity::ScreeningIdentityStore;
pub use idle::{IdleMonitor, IdleWatcher};
pub use lifecycle::{SessionLifecycleClient, SubmitOutcome};
pub use registration::RegistrationService;
pub use restart::{RestartCoordinator, RestartOutcome};
