use anyhow::Result;
use caller::CallState;
use caller::model::{CallDirection, CallOutcome, CallType};

use crate::integration::{init_tracing, phone, start_relay, wait_for_state};

#[tokio::test]
async fn test_call_through_relay() -> Result<()> {
    init_tracing();
    let (url, _relay) = start_relay().await?;
    let alice = phone(&url, "alice").await?;
    let bob = phone(&url, "bob").await?;

    alice
        .manager
        .start_outgoing_call("bob", "Bob", "+200", false)
        .await;

    let incoming = wait_for_state(&bob.manager, |s| matches!(s, CallState::Incoming(_))).await?;
    let details = incoming.details().cloned().expect("incoming call has details");
    assert_eq!(details.peer_name, "alice display");
    wait_for_state(&alice.manager, |s| matches!(s, CallState::Ringing(_))).await?;

    bob.manager.answer_call().await;
    wait_for_state(&bob.manager, |s| matches!(s, CallState::Ongoing(_))).await?;
    wait_for_state(&alice.manager, |s| matches!(s, CallState::Ongoing(_))).await?;

    alice.manager.end_call().await;
    wait_for_state(&bob.manager, CallState::is_idle).await?;
    assert!(alice.manager.state().is_idle());

    let alice_log = alice.log.all().await;
    assert_eq!(alice_log.len(), 1);
    assert_eq!(alice_log[0].outcome, CallOutcome::Answered);
    assert_eq!(alice_log[0].direction, CallDirection::Outgoing);
    assert_eq!(alice_log[0].peer_name, "Bob");

    let bob_log = bob.log.all().await;
    assert_eq!(bob_log.len(), 1);
    assert_eq!(bob_log[0].outcome, CallOutcome::Answered);
    assert_eq!(bob_log[0].direction, CallDirection::Incoming);
    assert_eq!(bob_log[0].call_type, CallType::Audio);
    Ok(())
}

#[tokio::test]
async fn test_rejected_call_through_relay() -> Result<()> {
    init_tracing();
    let (url, _relay) = start_relay().await?;
    let alice = phone(&url, "alice").await?;
    let bob = phone(&url, "bob").await?;

    alice
        .manager
        .start_outgoing_call("bob", "Bob", "+200", true)
        .await;
    wait_for_state(&bob.manager, |s| matches!(s, CallState::Incoming(_))).await?;

    bob.manager.reject_call().await;
    wait_for_state(&alice.manager, CallState::is_idle).await?;

    assert_eq!(alice.log.all().await[0].outcome, CallOutcome::Rejected);
    assert_eq!(bob.log.all().await[0].outcome, CallOutcome::Rejected);
    assert_eq!(bob.log.all().await[0].call_type, CallType::Video);

    alice.client.disconnect().await;
    bob.client.disconnect().await;
    Ok(())
}
