use screening_core::model::ModuleId;
use screening_core::{GuardState, Stage};
use services::InMemoryScreeningApi;

use crate::views::test_harness::{
    ViewKind, Visitor, setup_view_harness, setup_view_harness_with_api,
};

#[tokio::test(flavor = "current_thread")]
async fn home_view_offers_registration_to_new_visitors() {
    let mut harness = setup_view_harness(ViewKind::Home, Visitor::Anonymous).await;
    harness.rebuild();

    let html = harness.render();
    assert!(html.contains("register-name"));
    assert!(html.contains("register-email"));
    assert!(html.contains("register-age"));
    assert!(!html.contains("home-sign-out"));
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_greets_a_registered_user() {
    let mut harness = setup_view_harness(ViewKind::Home, Visitor::Registered).await;
    harness.rebuild();

    let html = harness.render();
    assert!(html.contains("Welcome, Ada"));
    assert!(html.contains("We sent you an email"));
    assert!(html.contains("home-sign-out"));
    assert!(!html.contains("home-start-over"));
}

#[tokio::test(flavor = "current_thread")]
async fn assessment_waits_for_email_verification() {
    let mut harness = setup_view_harness(ViewKind::Assessment, Visitor::Registered).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Check your email"));
    assert!(html.contains("stage-awaiting-verification"));
}

#[tokio::test(flavor = "current_thread")]
async fn assessment_opens_on_the_disclaimer_once_verified() {
    let mut harness = setup_view_harness(ViewKind::Assessment, Visitor::Verified).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Consent"));
    assert!(html.contains("disclaimer-accept"));
    assert_eq!(
        harness.services.flow().exit_guard().state(),
        GuardState::Disarmed
    );
}

#[tokio::test(flavor = "current_thread")]
async fn pre_test_shows_remaining_attempts() {
    let mut harness = setup_view_harness(ViewKind::Assessment, Visitor::Verified).await;
    let flow = harness.services.flow();
    flow.accept_disclaimer().unwrap();
    flow.acknowledge_false_positive().unwrap();
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Pre-test briefing"));
    assert!(html.contains("3 attempts remaining"));
    assert!(!html.contains("pre-test-blocked"));
}

#[tokio::test(flavor = "current_thread")]
async fn pre_test_is_blocked_when_attempts_are_used_up() {
    let api = InMemoryScreeningApi::new(3, 2);
    let mut harness =
        setup_view_harness_with_api(ViewKind::Assessment, Visitor::Verified, api).await;
    let user = harness.user.clone().unwrap();
    harness.api.seed_ledger(user.id, 3, false, None);
    let flow = harness.services.flow();
    flow.accept_disclaimer().unwrap();
    flow.acknowledge_false_positive().unwrap();
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("pre-test-blocked"));
    assert!(html.contains("You have used all 3 attempts"));
    assert!(!html.contains("attempts remaining"));
}

#[tokio::test(flavor = "current_thread")]
async fn completed_ledger_skips_to_the_final_page() {
    let mut harness = setup_view_harness(ViewKind::Assessment, Visitor::Verified).await;
    let user = harness.user.clone().unwrap();
    harness
        .api
        .seed_ledger(user.id, 1, true, Some(ModuleId::new(2)));
    let flow = harness.services.flow();
    flow.accept_disclaimer().unwrap();
    flow.acknowledge_false_positive().unwrap();
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("stage-completed"));
    assert!(html.contains(Stage::Completed.title()));
}

#[tokio::test(flavor = "current_thread")]
async fn verify_link_confirms_the_address() {
    let mut harness = setup_view_harness(ViewKind::Verify(String::new()), Visitor::Registered).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Thanks, Ada"));
    assert!(harness.services.identity().is_verified());
}

#[tokio::test(flavor = "current_thread")]
async fn verify_link_with_unknown_token_shows_an_error() {
    let mut harness = setup_view_harness(
        ViewKind::Verify("not-a-real-token".into()),
        Visitor::Registered,
    )
    .await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("Back to the start page"));
    assert!(!harness.services.identity().is_verified());
}
