use std::sync::Arc;

use chrono::Duration;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use screening_core::model::{LanguageCode, RegistrationDraft, ScreeningUser};
use screening_core::time::fixed_now;
use services::{
    AppServices, Clock, InMemoryScreeningApi, RegistrationService, ScreeningFlowService,
};
use storage::PersistentStore;

use crate::context::{UiApp, build_app_context};
use crate::platform::WebviewTrap;
use crate::views::{AssessmentView, ExitPrompt, HomeView, VerifyView};

struct TestApp {
    services: AppServices,
    trap: Arc<WebviewTrap>,
}

impl UiApp for TestApp {
    fn flow(&self) -> Arc<ScreeningFlowService> {
        self.services.flow()
    }

    fn registration(&self) -> Arc<RegistrationService> {
        self.services.registration()
    }

    fn navigation_trap(&self) -> Arc<WebviewTrap> {
        Arc::clone(&self.trap)
    }

    fn language(&self) -> LanguageCode {
        LanguageCode::default()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Assessment,
    Verify(String),
}

/// Where the harness user starts out.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Visitor {
    Anonymous,
    Registered,
    Verified,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view.clone());
    use_context_provider(|| ExitPrompt(Signal::new(false)));
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::Assessment => rsx! { AssessmentView { restart: String::new() } },
        ViewKind::Verify(token) => rsx! { VerifyView { token } },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub api: InMemoryScreeningApi,
    pub services: AppServices,
    pub user: Option<ScreeningUser>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Let resources resolve and re-render a few times.
    pub async fn settle(&mut self) {
        for _ in 0..6 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub const HARNESS_EMAIL: &str = "ada@example.org";

pub async fn setup_view_harness(view: ViewKind, visitor: Visitor) -> ViewHarness {
    setup_view_harness_with_api(view, visitor, InMemoryScreeningApi::new(3, 2)).await
}

pub async fn setup_view_harness_with_api(
    view: ViewKind,
    visitor: Visitor,
    api: InMemoryScreeningApi,
) -> ViewHarness {
    let trap = Arc::new(WebviewTrap::new());
    let services = AppServices::assemble(
        Arc::new(api.clone()),
        PersistentStore::in_memory(),
        trap.clone(),
        Clock::fixed(fixed_now()),
        Duration::minutes(15),
    );

    let user = match visitor {
        Visitor::Anonymous => None,
        Visitor::Registered | Visitor::Verified => {
            let draft = RegistrationDraft {
                name: "Ada".into(),
                email: HARNESS_EMAIL.into(),
                age: 36,
            };
            let mut user = services
                .registration()
                .register(draft)
                .await
                .expect("register");
            if visitor == Visitor::Verified {
                let token = api.verification_token(HARNESS_EMAIL).expect("token");
                user = services
                    .registration()
                    .verify(&token)
                    .await
                    .expect("verify");
            }
            Some(user)
        }
    };

    // An empty verify token stands for "the token mailed to the harness user".
    let view = match view {
        ViewKind::Verify(token) if token.is_empty() => ViewKind::Verify(
            api.verification_token(HARNESS_EMAIL)
                .unwrap_or_default(),
        ),
        other => other,
    };

    let app = Arc::new(TestApp {
        services: services.clone(),
        trap,
    });
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });

    ViewHarness {
        dom,
        api,
        services,
        user,
    }
}
