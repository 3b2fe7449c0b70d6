use crate::media::{AudioWriter, FrameProducer, audio_ring_for};
use crate::session::session::SessionShared;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tether_core::{SignalingEvent, TrackKind, VideoFrame, decode};
use tracing::info;

/// How much decoded audio the playback ring holds.
pub const AUDIO_RING_PERIOD: Duration = Duration::from_millis(500);

/// Where the transport delivers a remote track's decoded media.
pub enum TrackSink {
    Video(FrameProducer<VideoFrame>),
    Audio(AudioWriter),
}

/// Notification handle given to the transport. Every callback is safe to call
/// from any thread, at any time, including after the session closed.
#[derive(Clone)]
pub struct SessionEvents {
    shared: Arc<SessionShared>,
}

impl SessionEvents {
    pub(crate) fn new(shared: Arc<SessionShared>) -> Self {
        Self { shared }
    }

    pub fn on_set_offer(&self, raw: &str) {
        self.dispatch(decode(raw));
    }

    pub fn on_notify(&self, raw: &str) {
        self.dispatch(decode(raw));
    }

    pub fn on_switched(&self, raw: &str) {
        self.dispatch(decode(raw));
    }

    pub fn on_disconnect(&self, error_code: i32, message: &str) {
        self.dispatch(SignalingEvent::DisconnectNotice {
            error_code,
            message: message.to_owned(),
        });
    }

    pub fn on_message(&self, label: &str, payload: impl Into<Bytes>) {
        self.dispatch(SignalingEvent::MessageReceived {
            label: label.to_owned(),
            payload: payload.into(),
        });
    }

    pub fn on_data_channel(&self, label: &str) {
        self.dispatch(SignalingEvent::DataChannelOpened {
            label: label.to_owned(),
        });
    }

    /// Binds a newly announced remote track to the session's pipelines.
    ///
    /// A second audio track replaces the playback ring; video tracks share one queue.
    pub fn on_track(&self, kind: TrackKind) -> TrackSink {
        info!("Remote {} track received", kind);
        match kind {
            TrackKind::Video => TrackSink::Video(FrameProducer::new(Arc::clone(&self.shared.video))),
            TrackKind::Audio => {
                let (writer, sink) = audio_ring_for(self.shared.audio.format(), AUDIO_RING_PERIOD);
                self.shared.audio.install_sink(Box::new(sink));
                TrackSink::Audio(writer)
            }
        }
    }

    pub fn dispatch(&self, event: SignalingEvent) {
        self.shared.dispatch(event);
    }
}
