//! Webview-side hooks for the exit guard.

mod scripts;
mod webview;

pub use scripts::NAVIGATION_LISTENER_SCRIPT;
pub use webview::{TrapCommand, WebviewTrap};
