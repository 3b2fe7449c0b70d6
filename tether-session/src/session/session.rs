use crate::channel::DataChannelRegistry;
use crate::lifecycle::ConnectionLifecycle;
use crate::media::{AudioPullAdapter, MediaFrameQueue};
use crate::session::SessionEvents;
use crate::transport::{Connector, Transport};
use std::sync::Arc;
use std::time::Duration;
use tether_core::{
    ConnectionId, ConnectionState, DataChannelSpec, DataMessage, DisconnectReason, Result,
    SessionConfig, SignalingEvent, TransportError, VideoFrame,
};
use tracing::{debug, info, warn};

/// State shared between the session owner and the transport's notification
/// context. Each member guards itself.
pub(crate) struct SessionShared {
    pub(crate) lifecycle: ConnectionLifecycle,
    pub(crate) registry: DataChannelRegistry,
    pub(crate) video: Arc<MediaFrameQueue<VideoFrame>>,
    pub(crate) messages: Arc<MediaFrameQueue<DataMessage>>,
    pub(crate) audio: Arc<AudioPullAdapter>,
}

impl SessionShared {
    fn new(config: &SessionConfig) -> Self {
        Self {
            lifecycle: ConnectionLifecycle::new(config.connection_timeout()),
            registry: DataChannelRegistry::new(config.data_channels.clone()),
            video: Arc::new(MediaFrameQueue::new()),
            messages: Arc::new(MediaFrameQueue::new()),
            audio: Arc::new(AudioPullAdapter::new(config.audio_format)),
        }
    }

    /// Routes one event to the component that owns it. Nothing escapes:
    /// events that do not fit the current state are logged and dropped.
    pub(crate) fn dispatch(&self, event: SignalingEvent) {
        match event {
            SignalingEvent::DataChannelOpened { label } => {
                self.registry.on_channel_opened(&label);
            }

            SignalingEvent::MessageReceived { label, payload } => {
                let receivable = self
                    .registry
                    .spec(&label)
                    .is_some_and(|spec| spec.direction.can_receive());
                if !receivable {
                    debug!("Message on '{}', which is not configured to receive", label);
                }
                self.messages.push(DataMessage { label, payload });
            }

            SignalingEvent::Ignored => {}

            event => {
                if let Err(e) = self.lifecycle.on_event(&event) {
                    warn!("Ignoring signaling event: {}", e);
                }
            }
        }

        if self.lifecycle.is_closed() {
            self.close_pipelines();
        }
    }

    /// Wakes every blocked sender and consumer. Idempotent.
    pub(crate) fn close_pipelines(&self) {
        self.registry.close();
        self.video.close();
        self.messages.close();
    }
}

/// One signaling-mediated session: the lifecycle, its data channels and the
/// inbound media pipelines, bound to one transport connection.
pub struct Session {
    config: SessionConfig,
    shared: Arc<SessionShared>,
    transport: Arc<dyn Transport>,
}

impl Session {
    /// Validates `config` and creates the transport connection.
    pub fn new(config: SessionConfig, connector: &dyn Connector) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(SessionShared::new(&config));
        let events = SessionEvents::new(Arc::clone(&shared));
        let transport = connector.create_connection(&config, events)?;

        info!(
            "Session created: channel_id={} role={:?} data_channels={}",
            config.channel_id,
            config.role,
            config.data_channels.len()
        );

        Ok(Self {
            config,
            shared,
            transport,
        })
    }

    /// Connects and blocks until this client's connection is confirmed.
    ///
    /// On failure the session is closed; call [`disconnect`](Self::disconnect)
    /// to release the transport.
    pub fn connect(&self) -> Result<()> {
        let result = self.shared.lifecycle.connect(self.transport.as_ref());
        if self.shared.lifecycle.is_closed() {
            self.shared.close_pipelines();
        }
        result
    }

    /// Closes the session. Returns whether this call did anything; repeated
    /// calls, or a call after the transport already disconnected, are no-ops.
    pub fn disconnect(&self) -> bool {
        let changed = self.shared.lifecycle.disconnect(self.transport.as_ref());
        self.shared.close_pipelines();
        if changed {
            info!("Session disconnected");
        }
        changed
    }

    /// Unblocks a pending `connect` and every waiting `send` without touching
    /// the transport. Safe from any thread; the session still needs a
    /// [`disconnect`](Self::disconnect).
    pub fn interrupt(&self) {
        debug!("Session interrupted");
        self.shared.lifecycle.interrupt();
        self.shared.registry.close();
    }

    /// Sends on `label`, waiting for the channel to open first.
    pub fn send(&self, label: &str, payload: impl AsRef<[u8]>) -> Result<()> {
        self.shared
            .registry
            .send(self.transport.as_ref(), label, payload.as_ref())
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lifecycle.state()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.lifecycle.is_connected()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lifecycle.is_closed()
    }

    pub fn is_switched(&self) -> bool {
        self.shared.lifecycle.is_switched()
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.shared.lifecycle.connection_id()
    }

    pub fn disconnect_reason(&self) -> Option<DisconnectReason> {
        self.shared.lifecycle.disconnect_reason()
    }

    pub fn wait_closed(&self, timeout: Duration) -> bool {
        self.shared.lifecycle.wait_closed(timeout)
    }

    pub fn is_sendable(&self, label: &str) -> bool {
        self.shared.registry.is_sendable(label)
    }

    pub fn sendable_labels(&self) -> Vec<String> {
        self.shared.registry.sendable_labels()
    }

    pub fn data_channels(&self) -> &[DataChannelSpec] {
        self.shared.registry.specs()
    }

    /// Decoded frames of the remote video track.
    pub fn video_frames(&self) -> Arc<MediaFrameQueue<VideoFrame>> {
        Arc::clone(&self.shared.video)
    }

    /// Messages received on any data channel.
    pub fn messages(&self) -> Arc<MediaFrameQueue<DataMessage>> {
        Arc::clone(&self.shared.messages)
    }

    /// Adapter to bind to the playback device's pull callback.
    pub fn audio_output(&self) -> Arc<AudioPullAdapter> {
        Arc::clone(&self.shared.audio)
    }

    /// The transport's statistics report.
    pub fn stats(&self) -> Result<serde_json::Value> {
        let raw = self.transport.stats()?;
        let stats = serde_json::from_str(&raw).map_err(|e| TransportError::Stats {
            reason: e.to_string(),
        })?;
        Ok(stats)
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// A fresh notification handle, as given to the transport at creation.
    pub fn events(&self) -> SessionEvents {
        SessionEvents::new(Arc::clone(&self.shared))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
