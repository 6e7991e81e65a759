mod forfeit;
mod stages;
mod view;

pub use forfeit::ForfeitDialog;
pub use view::AssessmentView;
