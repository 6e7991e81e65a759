mod attempt;
mod ids;
mod language;
mod progress;
mod restart;
mod session;
mod user;

pub use ids::{ModuleId, ParseIdError, SessionId, UserId};
pub use language::LanguageCode;

pub use attempt::{AttemptAccess, AttemptBlock, AttemptStatus, AttemptStatusError};
pub use progress::{FlowKey, FlowProgress};
pub use restart::{RestartDirective, RestartOrigin, RestartSignal, RestartStamp};
pub use session::ModuleSessionRef;
pub use user::{Registration, RegistrationDraft, ScreeningUser, ValidationError};
