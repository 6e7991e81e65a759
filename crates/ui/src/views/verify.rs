use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::view_error_from_registration;

/// Landing page of the emailed verification link.
#[component]
pub fn VerifyView(token: String) -> Element {
    let ctx = use_context::<AppContext>();
    let registration = ctx.registration();

    let resource = use_resource(use_reactive!(|token| {
        let registration = registration.clone();
        async move {
            registration
                .verify(&token)
                .await
                .map(|user| user.name)
                .map_err(|err| view_error_from_registration(&err))
        }
    }));
    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "Email verification" }
            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { "Verifying your email address..." }
                },
                ViewState::Ready(name) => rsx! {
                    p { "Thanks, {name}. Your email address is verified." }
                    Link { to: Route::Assessment { restart: String::new() }, "Continue to the screening" }
                },
                ViewState::Error(err) => rsx! {
                    VerifyFailed { err }
                },
            }
        }
    }
}

#[component]
fn VerifyFailed(err: ViewError) -> Element {
    rsx! {
        p { class: "error", "{err.message()}" }
        Link { to: Route::Home {}, "Back to the start page" }
    }
}
