use dioxus::prelude::*;
use tracing::{debug, info};

use screening_core::model::RestartSignal;
use services::{IdleWatcher, RestartOutcome};

use super::stages::StageBody;
use crate::context::AppContext;
use crate::views::hooks::use_flow_revision;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::parse_restart_query;

const IDLE_RESTART_NOTICE: &str =
    "You were inactive for too long, so the screening restarted from the beginning.";

/// The gated pipeline. Exactly one stage is rendered, re-derived on every change.
#[component]
pub fn AssessmentView(restart: String) -> Element {
    let ctx = use_context::<AppContext>();
    let flow = ctx.flow();
    let language = ctx.language();
    let revision = use_flow_revision();
    let mut error = use_signal(|| None::<ViewError>);
    let notice = use_signal(|| None::<&'static str>);

    {
        let flow = flow.clone();
        use_effect(use_reactive!(|restart| {
            if let Some(stamp) = parse_restart_query(&restart) {
                let outcome = flow.apply_restart(RestartSignal::navigation(stamp));
                debug!(stamp = stamp.millis(), ?outcome, "restart requested by navigation");
            }
        }));
    }

    {
        let flow = flow.clone();
        let every = ctx.idle_poll_interval();
        use_future(move || {
            let flow = flow.clone();
            let mut notice = notice;
            async move {
                // Dropping the watcher on unmount stops the timer.
                let (_watcher, mut signals) =
                    IdleWatcher::spawn(flow.idle_monitor().clone(), flow.clock(), every);
                while let Some(signal) = signals.recv().await {
                    if flow.apply_restart(signal) == RestartOutcome::Applied {
                        info!("assessment restarted after inactivity");
                        notice.set(Some(IDLE_RESTART_NOTICE));
                    }
                }
            }
        });
    }

    let mut stage = {
        let flow = flow.clone();
        use_resource(move || {
            let flow = flow.clone();
            let language = language.clone();
            let _ = revision();
            async move { Ok::<_, ViewError>(flow.stage_view(&language).await) }
        })
    };
    let state = view_state_from_resource(&stage);

    let record_activity = {
        let flow = flow.clone();
        move |_| flow.record_activity()
    };

    rsx! {
        div { class: "page", id: "assessment-root", onclick: record_activity,
            if let Some(text) = notice() {
                p { class: "notice", "{text}" }
            }
            if let Some(err) = error() {
                p { class: "error", "{err.message()}" }
            }
            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                },
                ViewState::Ready(view) => rsx! {
                    h2 { "{view.stage.title()}" }
                    StageBody {
                        view,
                        on_change: move |()| {
                            error.set(None);
                            stage.restart();
                        },
                        on_error: move |err| error.set(Some(err)),
                    }
                },
            }
        }
    }
}
