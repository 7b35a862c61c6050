use caller_core::{CallState, PeerId};
use caller_session::MediaFlags;

use crate::integration::{create_test_call, init_tracing};
use crate::utils::{MediaCall, drain_states, remote_handle, settle};

#[tokio::test(start_paused = true)]
async fn test_toggles_forward_and_update_flags() {
    init_tracing();

    let mut call = create_test_call();
    let bob = PeerId::from("bob");

    call.establish_outgoing(&bob, true).await.unwrap();
    let before = call.manager.state();
    drain_states(&mut call.events);

    call.manager.toggle_mute(true).await;
    call.manager.toggle_video(false).await;
    call.manager.toggle_speaker(false).await;
    call.manager.switch_camera().await;

    assert_eq!(
        call.manager.flags(),
        MediaFlags {
            muted: true,
            video_enabled: false,
            speaker_on: false,
        }
    );

    let media = call.engine.last_session().await;
    assert_eq!(media.count(&MediaCall::ToggleAudio(false)).await, 1);
    assert_eq!(media.count(&MediaCall::ToggleVideo(false)).await, 1);
    assert_eq!(media.count(&MediaCall::Speaker(false)).await, 1);
    assert_eq!(media.count(&MediaCall::SwitchCamera).await, 1);

    assert_eq!(call.manager.state(), before);
    assert!(drain_states(&mut call.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_flags_reset_for_each_call() {
    init_tracing();

    let call = create_test_call();
    let bob = PeerId::from("bob");

    call.establish_outgoing(&bob, false).await.unwrap();
    call.manager.toggle_mute(true).await;
    call.manager.end_call().await;

    call.establish_outgoing(&bob, true).await.unwrap();
    assert_eq!(call.manager.flags(), MediaFlags::for_call(true));
}

#[tokio::test(start_paused = true)]
async fn test_remote_stream_updates_ongoing_in_place() {
    init_tracing();

    let call = create_test_call();
    let bob = PeerId::from("bob");

    call.establish_outgoing(&bob, true).await.unwrap();
    let CallState::Ongoing(before) = call.manager.state() else {
        unreachable!()
    };

    let media = call.engine.last_session().await;
    media.emit_remote_stream(remote_handle(false)).await;
    media.emit_remote_stream(remote_handle(true)).await;
    settle().await;

    let CallState::Ongoing(after) = call.manager.state() else {
        panic!("Remote media must not end the call");
    };
    assert_eq!(after.details, before.details);
    assert_eq!(after.local_media, before.local_media);
    assert_eq!(after.remote_media, Some(remote_handle(true)));
}
