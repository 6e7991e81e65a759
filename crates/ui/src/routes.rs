use dioxus::document::eval;
use dioxus::prelude::*;
use dioxus_router::{Outlet, Routable, use_navigator};
use tracing::debug;

use screening_core::{InterceptOutcome, NavigationAttempt};

use crate::context::AppContext;
use crate::platform::NAVIGATION_LISTENER_SCRIPT;
use crate::views::{
    AssessmentView, ExitPrompt, ForfeitDialog, HomeView, VerifyView, use_flow_revision,
};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/verify/:token", VerifyView)] Verify { token: String },
        #[route("/assessment?:restart", AssessmentView)] Assessment { restart: String },
}

#[component]
fn Layout() -> Element {
    let ctx = use_context::<AppContext>();
    let prompt = use_context_provider(|| ExitPrompt(Signal::new(false)));
    let ExitPrompt(open) = prompt;

    {
        let trap = ctx.navigation_trap();
        use_future(move || {
            let trap = trap.clone();
            async move {
                loop {
                    for command in trap.next_batch().await {
                        debug!(?command, "applying navigation trap");
                        let _ = eval(command.script());
                    }
                }
            }
        });
    }

    {
        let flow = ctx.flow();
        use_future(move || {
            let flow = flow.clone();
            let mut open = open;
            async move {
                let mut listener = eval(NAVIGATION_LISTENER_SCRIPT);
                while let Ok(kind) = listener.recv::<String>().await {
                    if kind == "back"
                        && flow.intercept_navigation(NavigationAttempt::Back)
                            == InterceptOutcome::ShowWarning
                    {
                        open.set(true);
                    }
                }
            }
        });
    }

    rsx! {
        div { class: "app",
            TopBar {}
            main { class: "content",
                Outlet::<Route> {}
            }
            if open() {
                ForfeitDialog {}
            }
        }
    }
}

#[component]
fn TopBar() -> Element {
    let ctx = use_context::<AppContext>();
    let ExitPrompt(mut open) = use_context::<ExitPrompt>();
    let navigator = use_navigator();
    let revision = use_flow_revision();
    let _ = revision();
    let user = ctx.flow().identity().get_user();
    let flow = ctx.flow();

    let go_home = move |_| match flow.intercept_navigation(NavigationAttempt::Back) {
        InterceptOutcome::Proceed => {
            navigator.push(Route::Home {});
        }
        InterceptOutcome::ShowWarning => open.set(true),
    };

    rsx! {
        header { class: "topbar",
            button { class: "secondary", id: "topbar-home", onclick: go_home, "Screening" }
            if let Some(user) = user {
                span { id: "topbar-user", "{user.name}" }
            }
        }
    }
}
