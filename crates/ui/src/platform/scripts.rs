pub(super) const PUSH_HISTORY_SCRIPT: &str = r#"
    history.pushState({ screeningGuard: true }, "", location.href);
"#;

pub(super) const REGISTER_UNLOAD_SCRIPT: &str = r#"
    if (!window.__screeningUnload) {
        window.__screeningUnload = (event) => {
            event.preventDefault();
            event.returnValue = "";
            return "";
        };
        window.addEventListener("beforeunload", window.__screeningUnload);
    }
"#;

pub(super) const RELEASE_SCRIPT: &str = r#"
    if (window.__screeningUnload) {
        window.removeEventListener("beforeunload", window.__screeningUnload);
        window.__screeningUnload = null;
    }
"#;

/// Reports history pops back to Rust as `"back"` messages.
pub const NAVIGATION_LISTENER_SCRIPT: &str = r#"
    if (window.__screeningPopstate) {
        window.removeEventListener("popstate", window.__screeningPopstate);
    }
    window.__screeningPopstate = () => dioxus.send("back");
    window.addEventListener("popstate", window.__screeningPopstate);
    await new Promise(() => {});
"#;
