use super::*;
use crate::transform::fakes::EchoTransform;

fn grammar(text: &str) -> ActionRequest {
    ActionRequest::new(ActionKind::CorrectGrammar, text)
}

#[test]
fn second_dispatch_while_busy_is_a_no_op() {
    let mut dispatcher = ActionDispatcher::new();
    let first = dispatcher.begin(&grammar("a")).unwrap();
    let state = dispatcher.state();

    assert!(dispatcher.begin(&ActionRequest::new(ActionKind::Summarize, "a")).is_none());
    assert!(dispatcher.begin(&grammar("a")).is_none());
    assert_eq!(dispatcher.state(), state);
    assert_eq!(dispatcher.busy_kind(), Some(ActionKind::CorrectGrammar));

    assert!(dispatcher.settle(&first, true));
    assert_eq!(dispatcher.state(), DispatchState::Idle);
    assert!(dispatcher.begin(&grammar("b")).is_some());
}

#[test]
fn settle_with_foreign_ticket_is_ignored() {
    let mut dispatcher = ActionDispatcher::new();
    let mut other = ActionDispatcher::new();
    let foreign = other.begin(&grammar("x")).unwrap();
    let _mine = dispatcher.begin(&grammar("y")).unwrap();

    assert!(!dispatcher.settle(&foreign, true));
    assert!(dispatcher.is_busy());
}

#[test]
fn cancelled_ticket_never_settles() {
    let mut dispatcher = ActionDispatcher::new();
    let ticket = dispatcher.begin(&grammar("x")).unwrap();
    dispatcher.cancel();

    assert!(ticket.token.is_cancelled());
    assert_eq!(dispatcher.state(), DispatchState::Idle);
    assert!(!dispatcher.settle(&ticket, true));

    // A fresh dispatch after cancellation still works
    let next = dispatcher.begin(&grammar("x")).unwrap();
    assert!(!dispatcher.settle(&ticket, true));
    assert!(dispatcher.settle(&next, true));
}

#[test]
fn requests_for_menu_actions() {
    let translate = MenuAction::Translate(TranslateTarget::Fixed(Language::English));
    assert_eq!(
        ActionRequest::for_action(&translate, "سلام"),
        Some(ActionRequest::translate("سلام", Language::English))
    );
    assert_eq!(ActionRequest::for_action(&MenuAction::AdjustTone, "x"), None);
    assert_eq!(
        ActionRequest::for_action(&MenuAction::Translate(TranslateTarget::Picker), "x"),
        None
    );
}

#[test]
fn execute_routes_each_kind() {
    let fake = EchoTransform::default();
    let run = |request: ActionRequest| execute(&fake, &request, Tone::Formal).text;

    assert_eq!(run(grammar("t")), "grammar:t");
    assert_eq!(run(ActionRequest::new(ActionKind::FixWriting, "t")), "grammar:t");
    assert_eq!(run(ActionRequest::new(ActionKind::Summarize, "t")), "summary:t");
    assert_eq!(
        run(ActionRequest::translate("t", Language::German)),
        "translate-de-formal:t"
    );
    assert_eq!(
        run(ActionRequest::adjust_tone("t", Tone::Creative)),
        "tone-creative:t"
    );
    // No tone given: the default applies
    assert_eq!(
        run(ActionRequest::new(ActionKind::AdjustTone, "t")),
        "tone-formal:t"
    );
}

#[test]
fn translate_without_target_is_an_error_result() {
    let fake = EchoTransform::default();
    let result = execute(
        &fake,
        &ActionRequest::new(ActionKind::Translate, "t"),
        Tone::Formal,
    );
    assert_eq!(result.status, ResultStatus::Error);
    assert!(fake.calls.lock().is_empty());
}

#[test]
fn service_failure_becomes_error_result_with_notice() {
    let fake = EchoTransform::failing();
    let result = execute(&fake, &grammar("t"), Tone::Formal);
    assert_eq!(result.status, ResultStatus::Error);
    assert!(result.text.is_empty());
    assert!(result.message.unwrap().contains("backend unavailable"));
}

#[test]
fn missing_credentials_are_reported_not_returned_as_text() {
    let fake = EchoTransform::unconfigured();
    let result = execute(&fake, &grammar("I has a apple"), Tone::Formal);
    assert_eq!(result.status, ResultStatus::NeedsConfiguration);
    assert!(!result.is_success());
    assert_eq!(result.message.as_deref(), Some("grammar needs an API key"));
}

#[test]
fn background_dispatch_delivers_one_settlement() {
    let mut dispatcher = ActionDispatcher::new();
    let request = ActionRequest::new(ActionKind::Summarize, "long text");
    let ticket = dispatcher.begin(&request).unwrap();

    let rx = spawn_dispatch(
        Arc::new(EchoTransform::default()),
        request.clone(),
        ticket,
        Tone::Formal,
    );
    let settlement = rx.recv_blocking().unwrap();
    assert_eq!(settlement.request, request);
    assert_eq!(settlement.result, ActionResult::success("summary:long text"));
    assert!(dispatcher.settle(&settlement.ticket, settlement.result.is_success()));
    assert!(rx.recv_blocking().is_err());
}

#[test]
fn background_dispatch_cancelled_before_start_sends_nothing() {
    let mut dispatcher = ActionDispatcher::new();
    let request = grammar("x");
    let ticket = dispatcher.begin(&request).unwrap();
    dispatcher.cancel();

    let fake = Arc::new(EchoTransform::default());
    let rx = spawn_dispatch(fake.clone(), request, ticket, Tone::Formal);
    assert!(rx.recv_blocking().is_err());
    assert!(fake.calls.lock().is_empty());
}
