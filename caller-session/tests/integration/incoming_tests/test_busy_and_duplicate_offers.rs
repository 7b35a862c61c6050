use caller_core::{
    CallState, IncomingOffer, PeerId, SessionDescription,
};

use crate::integration::{create_test_call, init_tracing};
use crate::utils::{drain_states, remote_offer};

#[tokio::test(start_paused = true)]
async fn test_offer_from_other_peer_while_busy_is_turned_away() {
    init_tracing();

    let mut call = create_test_call();
    let bob = PeerId::from("bob");
    let carol = PeerId::from("carol");

    call.establish_outgoing(&bob, false).await.unwrap();
    let before = call.manager.state();
    drain_states(&mut call.events);

    call.deliver(remote_offer(&carol, true)).await;

    assert_eq!(call.manager.state(), before);
    assert!(drain_states(&mut call.events).is_empty());
    assert_eq!(call.signaling.end_calls_to(&carol).await, 1);
    assert_eq!(call.signaling.end_calls_to(&bob).await, 0);
    assert_eq!(call.engine.session_count().await, 1);
    assert!(call.log.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_offer_is_idempotent() {
    init_tracing();

    let mut call = create_test_call();
    let alice = PeerId::from("alice");

    call.deliver(remote_offer(&alice, false)).await;
    let first = call.manager.state();
    assert!(matches!(first, CallState::Incoming(_)));

    call.deliver(remote_offer(&alice, false)).await;
    call.manager
        .handle_incoming_offer(IncomingOffer {
            from: alice.clone(),
            caller_name: "Alice".into(),
            is_video: false,
            description: SessionDescription::offer("v=0 again"),
            room_id: None,
        })
        .await;

    assert_eq!(call.manager.state(), first);
    assert_eq!(drain_states(&mut call.events).len(), 1);
    assert_eq!(call.engine.session_count().await, 1);
    assert_eq!(call.signaling.end_calls_to(&alice).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_host_delivered_offer_rings() {
    init_tracing();

    let call = create_test_call();

    call.manager
        .handle_incoming_offer(IncomingOffer {
            from: PeerId::from("dave"),
            caller_name: "Dave".into(),
            is_video: true,
            description: SessionDescription::offer("v=0"),
            room_id: None,
        })
        .await;

    let CallState::Incoming(details) = call.manager.state() else {
        panic!("Expected incoming call");
    };
    assert_eq!(details.peer_name, "Dave");
    assert!(details.is_video);
}
