use crate::session::SessionEvents;
use std::sync::Arc;
use tether_core::{SessionConfig, TransportError, VideoFrame};

/// The connection object of the underlying media SDK.
///
/// Implementations deliver their asynchronous notifications through the
/// [`SessionEvents`] handle they were created with, from whatever thread they
/// like. None of these calls may be made while the session holds a lock.
pub trait Transport: Send + Sync {
    /// Starts connecting. Returns once the attempt is under way; the outcome
    /// arrives later as notifications.
    fn connect(&self) -> Result<(), TransportError>;

    /// Tears the connection down. Calling it on a closed transport must be harmless.
    fn disconnect(&self) -> Result<(), TransportError>;

    fn send_data_channel(&self, label: &str, payload: &[u8]) -> Result<(), TransportError>;

    /// Hands a captured frame to the outgoing video track.
    fn send_video_frame(&self, frame: &VideoFrame) -> Result<(), TransportError>;

    /// Hands captured interleaved PCM to the outgoing audio track.
    fn send_audio(&self, samples: &[i16]) -> Result<(), TransportError>;

    /// Raw JSON statistics report.
    fn stats(&self) -> Result<String, TransportError>;
}

/// Creates transports bound to a session's notification handle.
pub trait Connector {
    fn create_connection(
        &self,
        config: &SessionConfig,
        events: SessionEvents,
    ) -> Result<Arc<dyn Transport>, TransportError>;
}
