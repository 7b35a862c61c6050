use caller_core::{CallOutcome, CallState, PeerId};

use crate::integration::{create_test_call, init_tracing};
use crate::utils::{drain_states, remote_offer, state_names};

#[tokio::test(start_paused = true)]
async fn test_clear_ends_active_call() {
    init_tracing();

    let mut call = create_test_call();
    let alice = PeerId::from("alice");

    call.establish_incoming(&alice, true).await.unwrap();
    drain_states(&mut call.events);

    call.manager.clear_call_state().await;

    assert_eq!(call.manager.state(), CallState::Idle);
    assert_eq!(
        state_names(&drain_states(&mut call.events)),
        vec!["ended", "idle"]
    );
    assert_eq!(call.signaling.end_calls_to(&alice).await, 1);
    assert_eq!(call.engine.last_session().await.close_count().await, 1);
    assert_eq!(call.log.all().await[0].outcome, CallOutcome::Answered);
}

#[tokio::test(start_paused = true)]
async fn test_clear_while_idle_is_silent() {
    init_tracing();

    let mut call = create_test_call();

    call.manager.clear_call_state().await;

    assert!(drain_states(&mut call.events).is_empty());
    assert!(call.log.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_ends_call_and_stops_session() {
    init_tracing();

    let call = create_test_call();
    let alice = PeerId::from("alice");

    call.deliver(remote_offer(&alice, false)).await;
    call.manager.shutdown().await;

    assert_eq!(call.manager.state(), CallState::Idle);
    assert_eq!(call.log.all().await[0].outcome, CallOutcome::Rejected);
    assert_eq!(call.signaling.end_calls_to(&alice).await, 1);

    // Requests after shutdown resolve without effect.
    call.manager
        .start_outgoing_call("bob", "Bob", "+100", false)
        .await;
    assert_eq!(call.manager.state(), CallState::Idle);
    assert_eq!(call.engine.session_count().await, 1);
}
