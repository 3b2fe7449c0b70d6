use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tether_core::{SessionConfig, TransportError, VideoFrame};
use tether_session::{Connector, SessionEvents, Transport};

use super::signal_helpers::{created_json, offer_json};

/// Delay before the scripted handshake starts.
pub const HANDSHAKE_DELAY_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect,
    Disconnect,
    SendData { label: String, payload: Vec<u8> },
    VideoFrame { width: u32, height: u32 },
    Audio { samples: usize },
    Stats,
}

/// Mock transport that records every call and, when scripted, answers
/// `connect` with an offer plus `connection.created` for its own id.
#[derive(Clone, Default)]
pub struct MockTransport {
    calls: Arc<Mutex<Vec<TransportCall>>>,
    events: Arc<Mutex<Option<SessionEvents>>>,
    handshake: Option<String>,
    fail_connect: bool,
}

impl MockTransport {
    /// Never answers `connect`; tests deliver notifications themselves.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Completes the handshake as `connection_id` shortly after `connect`.
    pub fn with_handshake(connection_id: &str) -> Self {
        Self {
            handshake: Some(connection_id.to_owned()),
            ..Self::default()
        }
    }

    pub fn failing_connect() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    /// The notification handle the session registered.
    pub fn events(&self) -> SessionEvents {
        self.events
            .lock()
            .clone()
            .expect("session was not created with this transport")
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &TransportCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn sent_on(&self, label: &str) -> Vec<Vec<u8>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                TransportCall::SendData { label: l, payload } if l == label => {
                    Some(payload.clone())
                }
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TransportCall) {
        tracing::debug!("[MockTransport] {:?}", call);
        self.calls.lock().push(call);
    }
}

impl Transport for MockTransport {
    fn connect(&self) -> Result<(), TransportError> {
        self.record(TransportCall::Connect);
        if self.fail_connect {
            return Err(TransportError::ConnectFailed {
                reason: "refused".into(),
            });
        }

        if let Some(id) = self.handshake.clone() {
            let events = self.events();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(HANDSHAKE_DELAY_MS));
                events.on_set_offer(&offer_json(&id));
                events.on_notify(&created_json("someone-else"));
                events.on_notify(&created_json(&id));
            });
        }
        Ok(())
    }

    fn disconnect(&self) -> Result<(), TransportError> {
        self.record(TransportCall::Disconnect);
        Ok(())
    }

    fn send_data_channel(&self, label: &str, payload: &[u8]) -> Result<(), TransportError> {
        self.record(TransportCall::SendData {
            label: label.to_owned(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn send_video_frame(&self, frame: &VideoFrame) -> Result<(), TransportError> {
        self.record(TransportCall::VideoFrame {
            width: frame.width,
            height: frame.height,
        });
        Ok(())
    }

    fn send_audio(&self, samples: &[i16]) -> Result<(), TransportError> {
        self.record(TransportCall::Audio {
            samples: samples.len(),
        });
        Ok(())
    }

    fn stats(&self) -> Result<String, TransportError> {
        self.record(TransportCall::Stats);
        Ok(r#"[{"type": "mock", "calls": 0}]"#.to_owned())
    }
}

impl Connector for MockTransport {
    fn create_connection(
        &self,
        _config: &SessionConfig,
        events: SessionEvents,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        *self.events.lock() = Some(events);
        Ok(Arc::new(self.clone()))
    }
}
