use caller_core::{CallOutcome, CallState, PeerId};

use crate::integration::{create_test_call_with, init_tracing};
use crate::utils::{MediaBehavior, MockMediaEngine, call_ended, drain_states, state_names};

#[tokio::test(start_paused = true)]
async fn test_failing_close_still_records_once() {
    init_tracing();

    let engine = MockMediaEngine::with_behavior(MediaBehavior {
        fail_close: true,
        ..Default::default()
    });
    let mut call = create_test_call_with(engine);
    let bob = PeerId::from("bob");

    call.establish_outgoing(&bob, false).await.unwrap();
    drain_states(&mut call.events);

    call.manager.end_call().await;
    call.deliver(call_ended(&bob)).await;
    call.manager.end_call().await;

    assert_eq!(call.manager.state(), CallState::Idle);
    assert_eq!(
        state_names(&drain_states(&mut call.events)),
        vec!["ended", "idle"]
    );
    assert_eq!(call.engine.last_session().await.close_count().await, 1);
    assert_eq!(call.log.len().await, 1);
    assert_eq!(call.log.all().await[0].outcome, CallOutcome::Answered);
}
