use std::time::Duration;

use caller_core::{CallOutcome, CallState, PeerId};

use crate::integration::{create_test_call_with, init_tracing};
use crate::utils::{MediaBehavior, MockMediaEngine, call_ended, remote_offer};

fn slow_answer_engine() -> MockMediaEngine {
    MockMediaEngine::with_behavior(MediaBehavior {
        answer_delay: Some(Duration::from_secs(2)),
        ..Default::default()
    })
}

#[tokio::test(start_paused = true)]
async fn test_peer_hangup_while_answering_is_answered() {
    init_tracing();

    let call = create_test_call_with(slow_answer_engine());
    let alice = PeerId::from("alice");

    call.deliver(remote_offer(&alice, false)).await;
    call.manager.answer_call().await;
    assert!(matches!(call.manager.state(), CallState::Incoming(_)));

    call.deliver(call_ended(&alice)).await;

    assert!(call.manager.state().is_idle());
    let records = call.log.all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, CallOutcome::Answered);
    assert_eq!(records[0].duration_ms, 0);
    assert_eq!(call.signaling.answers_to(&alice).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_local_hangup_while_answering_is_answered() {
    init_tracing();

    let call = create_test_call_with(slow_answer_engine());
    let alice = PeerId::from("alice");

    call.deliver(remote_offer(&alice, true)).await;
    call.manager.answer_call().await;
    call.manager.end_call().await;

    assert!(call.manager.state().is_idle());
    assert_eq!(call.log.all().await[0].outcome, CallOutcome::Answered);
    assert_eq!(call.signaling.end_calls_to(&alice).await, 1);

    // The aborted answer never completes.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(call.signaling.answers_to(&alice).await, 0);
    assert!(call.manager.state().is_idle());
}
