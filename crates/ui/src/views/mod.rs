mod assessment;
mod home;
mod hooks;
mod state;
mod verify;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use assessment::{AssessmentView, ForfeitDialog};
pub use home::HomeView;
pub use hooks::{ExitPrompt, use_flow_revision};
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use verify::VerifyView;
