use std::sync::Arc;

use tether_core::{DeviceError, Role, VideoFrame};
use tether_session::{Orchestrator, Session, Shutdown, StopReason, VideoCapture};

use crate::integration::{init_tracing, media_config};
use crate::utils::{ManualAudioInput, MockTransport, ScriptedCapture, TransportCall};

#[test]
fn test_sendonly_until_capture_ends() {
    init_tracing();

    let transport = MockTransport::with_handshake("A");
    let session = Arc::new(
        Session::new(media_config(Role::Sendonly), &transport).expect("Failed to create session"),
    );
    let orchestrator = Orchestrator::new(session.clone(), Shutdown::new());

    let mut capture = ScriptedCapture::new(6).skipping_every(3);
    let mut microphone = ManualAudioInput::default();
    let mic_handle = microphone.clone();

    let outcome = orchestrator
        .run_sendonly(&mut capture, &mut microphone)
        .expect("send run failed");

    assert_eq!(outcome.stop, StopReason::CaptureEnded);
    assert_eq!(outcome.frames, 6);
    assert_eq!(
        transport.count(&TransportCall::VideoFrame {
            width: 4,
            height: 2
        }),
        6
    );

    // Disconnected once and the microphone released
    assert_eq!(transport.count(&TransportCall::Disconnect), 1);
    let calls = transport.calls();
    assert_eq!(calls.last(), Some(&TransportCall::Disconnect));
    assert!(!mic_handle.is_running());
    assert!(!mic_handle.push(&[0; 160]));
}

/// Pushes one audio block through the microphone per captured frame.
struct AudioDrivingCapture {
    frames: ScriptedCapture,
    microphone: ManualAudioInput,
}

impl VideoCapture for AudioDrivingCapture {
    fn read(&mut self) -> Result<Option<VideoFrame>, DeviceError> {
        self.microphone.push(&[1; 160]);
        self.frames.read()
    }

    fn is_open(&self) -> bool {
        self.frames.is_open()
    }
}

#[test]
fn test_sendonly_forwards_captured_audio() {
    init_tracing();

    let transport = MockTransport::with_handshake("A");
    let session = Arc::new(
        Session::new(media_config(Role::Sendonly), &transport).expect("Failed to create session"),
    );
    let orchestrator = Orchestrator::new(session.clone(), Shutdown::new());

    let mut microphone = ManualAudioInput::default();
    let mut capture = AudioDrivingCapture {
        frames: ScriptedCapture::new(4),
        microphone: microphone.clone(),
    };

    let outcome = orchestrator
        .run_sendonly(&mut capture, &mut microphone)
        .expect("send run failed");

    assert_eq!(outcome.frames, 4);
    assert_eq!(transport.count(&TransportCall::Audio { samples: 160 }), 4);
}

#[test]
fn test_sendonly_without_audio_skips_microphone() {
    init_tracing();

    let transport = MockTransport::with_handshake("A");
    let mut config = media_config(Role::Sendonly);
    config.audio = false;
    let session = Arc::new(Session::new(config, &transport).expect("Failed to create session"));
    let orchestrator = Orchestrator::new(session, Shutdown::new());

    let mut microphone = ManualAudioInput::default();
    let mic_handle = microphone.clone();
    let mut capture = AudioDrivingCapture {
        frames: ScriptedCapture::new(2),
        microphone: mic_handle,
    };

    orchestrator
        .run_sendonly(&mut capture, &mut microphone)
        .expect("send run failed");

    assert_eq!(transport.count(&TransportCall::Audio { samples: 160 }), 0);
}
