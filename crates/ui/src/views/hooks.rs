use dioxus::prelude::*;
use tracing::debug;

use crate::context::AppContext;

/// Counter bumped on every flow event, for resources that re-derive on change.
pub fn use_flow_revision() -> Signal<u64> {
    let ctx = use_context::<AppContext>();
    let revision = use_signal(|| 0_u64);
    use_future(move || {
        let events = ctx.events();
        let mut revision = revision;
        async move {
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let _subscription = events.subscribe(move |event| {
                let _ = tx.send(event);
            });
            while let Some(event) = rx.recv().await {
                debug!(?event, "flow event observed");
                revision += 1;
            }
        }
    });
    revision
}

/// Set while the forfeiture warning is on screen.
#[derive(Clone, Copy, PartialEq)]
pub struct ExitPrompt(pub Signal<bool>);
