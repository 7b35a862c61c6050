use anyhow::Result;
use caller_core::{ClientSignal, RelaySignal, RoomId};
use caller_session::{ConnectionStatus, SignalingChannel};

use crate::integration::init_tracing;
use crate::utils::TestRelay;

#[tokio::test]
async fn test_disconnect_unregisters_and_leaves_rooms() -> Result<()> {
    init_tracing();
    let relay = TestRelay::start().await?;
    let room = RoomId::from("standup");
    let alice = relay.connect("alice").await?;
    let mut bob = relay.connect("bob").await?;

    alice.client.join_room(room.clone()).await?;
    bob.client.join_room(room.clone()).await?;
    relay.wait_for_members(&room, 2).await?;

    bob.client.disconnect().await;
    assert_eq!(bob.client.status(), ConnectionStatus::Closed);
    assert!(bob.inbox.recv().await.is_none());

    relay.wait_until(|s| !s.is_registered(&bob.id)).await?;
    relay.wait_for_members(&room, 1).await?;
    assert_eq!(relay.service.room_members(&room), vec![alice.id.clone()]);
    Ok(())
}

#[tokio::test]
async fn test_leave_room_keeps_registration() -> Result<()> {
    init_tracing();
    let relay = TestRelay::start().await?;
    let room = RoomId::from("standup");
    let alice = relay.connect("alice").await?;

    alice.client.join_room(room.clone()).await?;
    relay.wait_for_members(&room, 1).await?;

    alice.client.leave_room(room.clone()).await?;
    relay.wait_for_members(&room, 0).await?;
    assert!(relay.service.is_registered(&alice.id));
    Ok(())
}

#[tokio::test]
async fn test_newer_connection_takes_over_user() -> Result<()> {
    init_tracing();
    let relay = TestRelay::start().await?;
    let first = relay.connect("alice").await?;
    let stale = relay.service.connection_of(&first.id);
    let mut second = relay.connect("alice").await?;
    relay
        .wait_until(|s| s.connection_of(&second.id) != stale)
        .await?;
    let bob = relay.connect("bob").await?;

    // Closing the stale socket must not unregister the live one.
    first.client.disconnect().await;
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(relay.service.is_registered(&second.id));

    bob.client.send(ClientSignal::end_call(second.id.clone())).await?;
    assert_eq!(
        second.next_signal().await?,
        RelaySignal::CallEnded {
            user_id: bob.id.clone()
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_send_before_connect_fails() -> Result<()> {
    init_tracing();
    let relay = TestRelay::start().await?;
    let (client, _inbox) =
        caller_session::WsSignalingClient::new(caller_session::SignalingConfig::new(relay.url()));

    let result = client
        .send(ClientSignal::end_call(caller_core::PeerId::from("bob")))
        .await;

    assert!(result.is_err());
    assert!(!client.is_connected());
    Ok(())
}
