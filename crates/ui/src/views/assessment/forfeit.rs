use dioxus::prelude::*;
use dioxus_router::use_navigator;
use tracing::info;

use screening_core::ExitDecision;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::hooks::ExitPrompt;

/// Forfeiture warning shown when the user tries to leave a running attempt.
#[component]
pub fn ForfeitDialog() -> Element {
    let ctx = use_context::<AppContext>();
    let ExitPrompt(mut open) = use_context::<ExitPrompt>();
    let navigator = use_navigator();
    let flow = ctx.flow();

    let warning = {
        let flow = flow.clone();
        let language = ctx.language();
        use_resource(move || {
            let flow = flow.clone();
            let language = language.clone();
            async move { flow.forfeit_warning(&language).await }
        })
    };
    let message = warning
        .read()
        .as_ref()
        .map(|warning| warning.message());

    let stay = {
        let flow = flow.clone();
        move |_| {
            flow.stay_on_assessment();
            open.set(false);
        }
    };
    let leave = move |_| {
        if flow.confirm_exit() == ExitDecision::Leave {
            info!("user confirmed leaving the assessment");
            open.set(false);
            navigator.replace(Route::Home {});
        }
    };

    rsx! {
        div { class: "modal-backdrop",
            div { class: "modal", role: "alertdialog", id: "forfeit-dialog",
                h3 { "Leave the assessment?" }
                match message {
                    Some(text) => rsx! { p { "{text}" } },
                    None => rsx! { p { "Checking your remaining attempts..." } },
                }
                div { class: "actions",
                    button { id: "forfeit-stay", onclick: stay, "Stay" }
                    button { class: "secondary", id: "forfeit-leave", onclick: leave, "Leave" }
                }
            }
        }
    }
}
