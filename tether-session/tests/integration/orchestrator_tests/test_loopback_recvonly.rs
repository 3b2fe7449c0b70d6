use std::sync::Arc;
use std::time::Duration;

use tether_core::Role;
use tether_session::{
    CLOSE_SUCCEEDED, LoopbackConnector, LoopbackOptions, NoAudio, Orchestrator, Session, Shutdown,
    StopReason,
};

use crate::integration::{init_tracing, media_config};
use crate::utils::CountingDisplay;

fn loopback(disconnect_after: Option<Duration>) -> LoopbackConnector {
    LoopbackConnector::new(LoopbackOptions {
        frame_interval: Duration::from_millis(10),
        disconnect_after,
        ..LoopbackOptions::default()
    })
}

#[test]
fn test_loopback_recvonly_until_remote_close() {
    init_tracing();

    let session = Arc::new(
        Session::new(
            media_config(Role::Recvonly),
            &loopback(Some(Duration::from_millis(300))),
        )
        .expect("Failed to create session"),
    );
    let orchestrator = Orchestrator::new(session.clone(), Shutdown::new());
    let mut display = CountingDisplay::default();

    let outcome = orchestrator
        .run_recvonly(&mut display, &mut NoAudio)
        .expect("receive run failed");

    assert_eq!(
        outcome.stop,
        StopReason::TransportDisconnect {
            error_code: CLOSE_SUCCEEDED,
            message: "session ended".into()
        }
    );
    assert!(outcome.frames > 0);
    assert_eq!(outcome.frames, display.shown as u64);
    assert!(session.audio_output().has_sink());
}

#[test]
fn test_loopback_recvonly_display_quits() {
    init_tracing();

    let session = Arc::new(
        Session::new(media_config(Role::Recvonly), &loopback(None))
            .expect("Failed to create session"),
    );
    let orchestrator = Orchestrator::new(session.clone(), Shutdown::new());
    let mut display = CountingDisplay::quitting_after(5);

    let outcome = orchestrator
        .run_recvonly(&mut display, &mut NoAudio)
        .expect("receive run failed");

    assert_eq!(outcome.stop, StopReason::Quit);
    assert_eq!(outcome.frames, 5);
    assert!(session.is_closed());
    assert!(session.video_frames().is_closed());
}
