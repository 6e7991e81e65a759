use dioxus::prelude::*;
use dioxus_router::use_navigator;

use screening_core::{Stage, StageView};
use services::{FlowError, ModuleEntry};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::ViewError;
use crate::vm::{
    ModulePhase, ModuleRunnerVm, PreTestVm, module_payload, stage_body, view_error_from_flow,
};

fn report(
    result: Result<(), FlowError>,
    on_change: EventHandler<()>,
    on_error: EventHandler<ViewError>,
) {
    match result {
        Ok(()) => on_change.call(()),
        Err(err) => on_error.call(view_error_from_flow(&err)),
    }
}

#[component]
pub(super) fn StageBody(
    view: StageView,
    on_change: EventHandler<()>,
    on_error: EventHandler<ViewError>,
) -> Element {
    match view.stage {
        Stage::Unverified => rsx! { BackToRegistration {} },
        Stage::AwaitingVerification => rsx! {
            p { id: "stage-awaiting-verification", "{stage_body(Stage::AwaitingVerification)}" }
        },
        Stage::Disclaimer => rsx! { DisclaimerStage { on_change, on_error } },
        Stage::FalsePositive => rsx! { FalsePositiveStage { on_change, on_error } },
        Stage::PreTest => rsx! { PreTestStage { view, on_change, on_error } },
        Stage::Questionnaire => rsx! { QuestionnaireStage { on_change, on_error } },
        Stage::ModuleRunner => rsx! { ModuleRunnerStage { on_change, on_error } },
        Stage::Completed => {
            let message = view
                .access
                .status()
                .and_then(|status| status.completion_message())
                .unwrap_or(stage_body(Stage::Completed))
                .to_owned();
            rsx! {
                p { id: "stage-completed", "{message}" }
            }
        }
    }
}

#[component]
fn BackToRegistration() -> Element {
    let navigator = use_navigator();
    use_effect(move || {
        navigator.replace(Route::Home {});
    });
    rsx! {
        p { "{stage_body(Stage::Unverified)}" }
    }
}

#[component]
fn DisclaimerStage(on_change: EventHandler<()>, on_error: EventHandler<ViewError>) -> Element {
    let ctx = use_context::<AppContext>();
    let flow = ctx.flow();
    let mut agreed = use_signal(|| false);

    rsx! {
        p { "{stage_body(Stage::Disclaimer)}" }
        label {
            input {
                id: "disclaimer-agree",
                r#type: "checkbox",
                checked: agreed(),
                onchange: move |evt| agreed.set(evt.checked()),
            }
            " I have read and accept the terms above."
        }
        div { class: "actions",
            button {
                id: "disclaimer-accept",
                disabled: !agreed(),
                onclick: move |_| report(flow.accept_disclaimer(), on_change, on_error),
                "Accept and continue"
            }
        }
    }
}

#[component]
fn FalsePositiveStage(on_change: EventHandler<()>, on_error: EventHandler<ViewError>) -> Element {
    let ctx = use_context::<AppContext>();
    let flow = ctx.flow();

    rsx! {
        p { "{stage_body(Stage::FalsePositive)}" }
        div { class: "actions",
            button {
                id: "false-positive-ack",
                onclick: move |_| report(flow.acknowledge_false_positive(), on_change, on_error),
                "I understand"
            }
        }
    }
}

#[component]
fn PreTestStage(
    view: StageView,
    on_change: EventHandler<()>,
    on_error: EventHandler<ViewError>,
) -> Element {
    let ctx = use_context::<AppContext>();
    let vm = PreTestVm::from_view(&view);
    let mut starting = use_signal(|| false);

    let start = {
        let flow = ctx.flow();
        let language = ctx.language();
        move |_| {
            if starting() {
                return;
            }
            starting.set(true);
            let flow = flow.clone();
            let language = language.clone();
            spawn(async move {
                report(flow.complete_pre_test(&language).await, on_change, on_error);
                starting.set(false);
            });
        }
    };

    rsx! {
        p { "{stage_body(Stage::PreTest)}" }
        if let Some(label) = vm.remaining_label() {
            p { id: "pre-test-remaining", "{label}" }
        }
        if let Some(notice) = vm.notice.clone() {
            p { class: "notice", id: "pre-test-blocked", "{notice}" }
        }
        div { class: "actions",
            button {
                id: "pre-test-start",
                disabled: !vm.can_start || starting(),
                onclick: start,
                "Start the assessment"
            }
        }
    }
}

#[component]
fn QuestionnaireStage(on_change: EventHandler<()>, on_error: EventHandler<ViewError>) -> Element {
    let ctx = use_context::<AppContext>();
    let flow = ctx.flow();
    let mut answered = use_signal(|| false);

    rsx! {
        p { "{stage_body(Stage::Questionnaire)}" }
        label {
            input {
                id: "questionnaire-done",
                r#type: "checkbox",
                checked: answered(),
                onchange: move |evt| answered.set(evt.checked()),
            }
            " I have answered every question."
        }
        div { class: "actions",
            button {
                id: "questionnaire-close",
                disabled: !answered(),
                onclick: move |_| report(flow.close_questionnaire(), on_change, on_error),
                "Continue to the modules"
            }
        }
    }
}

#[component]
fn ModuleRunnerStage(on_change: EventHandler<()>, on_error: EventHandler<ViewError>) -> Element {
    let ctx = use_context::<AppContext>();
    let flow = ctx.flow();
    let language = ctx.language();
    let mut runner = use_signal(ModuleRunnerVm::default);

    {
        let flow = flow.clone();
        let language = language.clone();
        use_future(move || {
            let flow = flow.clone();
            let language = language.clone();
            async move {
                match flow.begin_modules(&language).await {
                    Ok(ModuleEntry::Completed) => {
                        runner.write().apply(ModuleEntry::Completed);
                        on_change.call(());
                    }
                    Ok(entry) => runner.write().apply(entry),
                    Err(err) => on_error.call(view_error_from_flow(&err)),
                }
            }
        });
    }

    let submit = move |_| {
        let Some(session) = runner.write().begin_submit() else {
            return;
        };
        let flow = flow.clone();
        let language = language.clone();
        spawn(async move {
            let payload = module_payload(&session, flow.clock().now());
            match flow.submit_module(&session, payload, &language).await {
                Ok(ModuleEntry::Completed) => {
                    runner.write().apply(ModuleEntry::Completed);
                    on_change.call(());
                }
                Ok(entry) => runner.write().apply(entry),
                Err(err) => {
                    runner.write().fail();
                    on_error.call(view_error_from_flow(&err));
                }
            }
        });
    };

    let vm = runner.read().clone();
    let module_number = vm.module_number().unwrap_or_default();
    rsx! {
        p { "{stage_body(Stage::ModuleRunner)}" }
        match vm.phase() {
            ModulePhase::Starting => rsx! {
                p { "Preparing your module..." }
            },
            ModulePhase::Completed => rsx! {
                p { "All modules are done." }
            },
            ModulePhase::Running(_) | ModulePhase::Submitting(_) => rsx! {
                div { id: "module-runner",
                    h3 { "Module {module_number}" }
                    div { class: "actions",
                        button {
                            id: "module-submit",
                            disabled: !vm.can_submit(),
                            onclick: submit,
                            "Finish module"
                        }
                    }
                }
            },
        }
    }
}
