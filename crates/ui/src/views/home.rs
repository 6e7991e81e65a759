use dioxus::prelude::*;
use dioxus_router::use_navigator;

use screening_core::Stage;
use screening_core::model::RestartStamp;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::ViewError;
use crate::views::hooks::use_flow_revision;
use crate::vm::{RegistrationForm, stage_body, view_error_from_registration};

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let revision = use_flow_revision();
    // Re-read the identity record whenever it changes.
    let _ = revision();
    let user = ctx.flow().identity().get_user();

    match user {
        None => rsx! { RegisterPanel {} },
        Some(user) => rsx! {
            WelcomePanel { name: user.name, verified: user.verified }
        },
    }
}

#[component]
fn RegisterPanel() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let mut form = use_signal(RegistrationForm::default);
    let mut error = use_signal(|| None::<ViewError>);
    let mut submitting = use_signal(|| false);

    let submit = {
        let registration = ctx.registration();
        use_callback(move |()| {
            if submitting() {
                return;
            }
            let draft = match form.read().to_draft() {
                Ok(draft) => draft,
                Err(err) => {
                    error.set(Some(err));
                    return;
                }
            };
            let registration = registration.clone();
            submitting.set(true);
            error.set(None);
            spawn(async move {
                match registration.register(draft).await {
                    Ok(_) => {
                        navigator.push(Route::Assessment {
                            restart: String::new(),
                        });
                    }
                    Err(err) => error.set(Some(view_error_from_registration(&err))),
                }
                submitting.set(false);
            });
        })
    };

    let current = form.read().clone();
    let can_submit = current.is_complete() && !submitting();

    rsx! {
        div { class: "page",
            h2 { "Register" }
            p { "{stage_body(Stage::Unverified)}" }
            form {
                class: "form",
                onsubmit: move |evt: FormEvent| {
                    evt.prevent_default();
                    submit.call(());
                },
                label {
                    "Full name"
                    input {
                        id: "register-name",
                        value: "{current.name}",
                        oninput: move |evt| form.write().name = evt.value(),
                    }
                }
                label {
                    "Email"
                    input {
                        id: "register-email",
                        r#type: "email",
                        value: "{current.email}",
                        oninput: move |evt| form.write().email = evt.value(),
                    }
                }
                label {
                    "Age"
                    input {
                        id: "register-age",
                        r#type: "number",
                        value: "{current.age}",
                        oninput: move |evt| form.write().age = evt.value(),
                    }
                }
                if let Some(err) = error() {
                    p { class: "error", "{err.message()}" }
                }
                div { class: "actions",
                    button { r#type: "submit", disabled: !can_submit, "Register" }
                }
            }
        }
    }
}

#[component]
fn WelcomePanel(name: String, verified: bool) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let flow = ctx.flow();
    let underway = flow.progress().assessment_underway();

    let start_over = {
        let flow = flow.clone();
        move |_| {
            let stamp = RestartStamp::at(flow.clock().now());
            navigator.push(Route::Assessment {
                restart: stamp.millis().to_string(),
            });
        }
    };
    let sign_out = move |_| flow.sign_out();

    rsx! {
        div { class: "page",
            h2 { "Welcome, {name}" }
            if verified {
                p { "Your email address is verified." }
            } else {
                p { "{stage_body(Stage::AwaitingVerification)}" }
            }
            div { class: "actions",
                button {
                    id: "home-continue",
                    onclick: move |_| {
                        navigator.push(Route::Assessment {
                            restart: String::new(),
                        });
                    },
                    if underway { "Continue assessment" } else { "Go to assessment" }
                }
                if underway {
                    button { class: "secondary", id: "home-start-over", onclick: start_over, "Start over" }
                }
                button { class: "secondary", id: "home-sign-out", onclick: sign_out, "Sign out" }
            }
        }
    }
}
