#![forbid(unsafe_code)]

pub mod decision;
pub mod error;
pub mod exit_guard;
pub mod model;
pub mod stage;
pub mod time;

pub use decision::{StartDecision, StartInputs, decide_module_start};
pub use error::Error;
pub use exit_guard::{
    ExitDecision, ExitGuard, ForfeitWarning, GuardState, InterceptOutcome, NavigationAttempt,
    NavigationTrap, NoopTrap,
};
pub use stage::{Stage, StageView, derive_stage};
pub use time::Clock;
