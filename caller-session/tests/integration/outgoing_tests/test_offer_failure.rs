use caller_core::{CallDirection, CallOutcome, CallState, PeerId};

use crate::integration::{create_test_call_with, init_tracing};
use crate::utils::{MediaBehavior, MockMediaEngine, drain_states, state_names, wait_for_state};

#[tokio::test(start_paused = true)]
async fn test_offer_creation_failure_ends_call() {
    init_tracing();

    let engine = MockMediaEngine::with_behavior(MediaBehavior {
        fail_offer: true,
        ..Default::default()
    });
    let mut call = create_test_call_with(engine);
    let bob = PeerId::from("bob");

    call.manager
        .start_outgoing_call(bob.clone(), "Bob", "+100", true)
        .await;
    wait_for_state(&call.manager, CallState::is_idle)
        .await
        .unwrap();

    let states = drain_states(&mut call.events);
    assert_eq!(state_names(&states), vec!["dialing", "ended", "idle"]);
    let CallState::Ended(reason) = &states[1] else {
        unreachable!()
    };
    assert!(
        reason.starts_with("Failed to start call:"),
        "unexpected reason: {reason}"
    );

    assert_eq!(call.signaling.offers_to(&bob).await, 0);
    // The offer never went out, so there is nobody to hang up on.
    assert_eq!(call.signaling.end_calls_to(&bob).await, 0);
    assert_eq!(call.engine.last_session().await.close_count().await, 1);

    let records = call.log.all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, CallOutcome::Failed);
    assert_eq!(records[0].duration_ms, 0);
    assert_eq!(records[0].direction, CallDirection::Outgoing);
    assert_eq!(records[0].peer_number, "+100");
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_ends_call() {
    init_tracing();

    let engine = MockMediaEngine::with_behavior(MediaBehavior {
        fail_capture: true,
        ..Default::default()
    });
    let call = create_test_call_with(engine);
    let bob = PeerId::from("bob");

    call.manager
        .start_outgoing_call(bob.clone(), "Bob", "+100", false)
        .await;
    wait_for_state(&call.manager, CallState::is_idle)
        .await
        .unwrap();
    crate::utils::settle().await;

    assert_eq!(call.signaling.offers_to(&bob).await, 0);
    assert_eq!(call.log.len().await, 1);
    assert_eq!(call.log.all().await[0].outcome, CallOutcome::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_offer_transmit_failure_ends_call() {
    init_tracing();

    let mut call = crate::integration::create_test_call();
    let bob = PeerId::from("bob");
    call.signaling.set_offline(true);

    call.manager
        .start_outgoing_call(bob.clone(), "Bob", "+100", false)
        .await;
    wait_for_state(&call.manager, CallState::is_idle)
        .await
        .unwrap();

    let states = drain_states(&mut call.events);
    assert!(states.iter().any(|s| matches!(
        s,
        CallState::Ended(reason) if reason.starts_with("Failed to start call:")
    )));
    assert_eq!(call.log.all().await[0].outcome, CallOutcome::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_engine_failure_ends_call() {
    init_tracing();

    let engine = MockMediaEngine::with_behavior(MediaBehavior {
        fail_create_session: true,
        ..Default::default()
    });
    let call = create_test_call_with(engine);

    call.manager
        .start_outgoing_call("bob", "Bob", "+100", false)
        .await;

    assert_eq!(call.manager.state(), CallState::Idle);
    assert_eq!(call.engine.session_count().await, 0);
    assert_eq!(call.log.all().await[0].outcome, CallOutcome::Failed);
}
