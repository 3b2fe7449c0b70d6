use crate::transport::Transport;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::time::Duration;
use tether_core::{DataChannelSpec, Result, SessionError};
use tracing::{debug, info, warn};

/// Upper bound on how long a blocked `send` sleeps before re-checking state.
pub const SEND_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct RegistryInner {
    sendable: HashSet<String>,
    closed: bool,
}

/// Tracks which configured data channels the transport has confirmed open
/// and that may carry outgoing payloads.
pub struct DataChannelRegistry {
    specs: Vec<DataChannelSpec>,
    inner: Mutex<RegistryInner>,
    ready: Condvar,
}

impl DataChannelRegistry {
    pub fn new(specs: Vec<DataChannelSpec>) -> Self {
        Self {
            specs,
            inner: Mutex::new(RegistryInner {
                sendable: HashSet::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    pub fn specs(&self) -> &[DataChannelSpec] {
        &self.specs
    }

    pub fn spec(&self, label: &str) -> Option<&DataChannelSpec> {
        self.specs.iter().find(|spec| spec.label == label)
    }

    /// Records that the transport opened `label`. Returns whether it became sendable.
    pub fn on_channel_opened(&self, label: &str) -> bool {
        let Some(spec) = self.spec(label) else {
            warn!("Transport opened unconfigured data channel '{}'", label);
            return false;
        };

        let mut inner = self.inner.lock();
        if inner.closed {
            debug!("Data channel '{}' opened after close, ignoring", label);
            return false;
        }
        if !spec.direction.can_send() {
            debug!("Data channel '{}' open ({})", label, spec.direction);
            return false;
        }

        if inner.sendable.insert(spec.label.clone()) {
            info!("Data channel '{}' ready ({})", label, spec.direction);
            self.ready.notify_all();
        }
        true
    }

    pub fn is_sendable(&self, label: &str) -> bool {
        self.inner.lock().sendable.contains(label)
    }

    /// Sendable labels in configuration order.
    pub fn sendable_labels(&self) -> Vec<String> {
        let inner = self.inner.lock();
        self.specs
            .iter()
            .filter(|spec| inner.sendable.contains(&spec.label))
            .map(|spec| spec.label.clone())
            .collect()
    }

    /// Marks the session closed and wakes every blocked sender.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if !inner.closed {
            inner.closed = true;
            inner.sendable.clear();
            self.ready.notify_all();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Blocks until `label` is sendable or the session closes.
    pub fn wait_sendable(&self, label: &str) -> Result<()> {
        match self.spec(label) {
            Some(spec) if spec.direction.can_send() => {}
            _ => {
                return Err(SessionError::ChannelNotSendable {
                    label: label.to_owned(),
                });
            }
        }

        let mut inner = self.inner.lock();
        loop {
            if inner.closed {
                return Err(SessionError::ChannelNeverReady {
                    label: label.to_owned(),
                });
            }
            if inner.sendable.contains(label) {
                return Ok(());
            }
            self.ready.wait_for(&mut inner, SEND_POLL_INTERVAL);
        }
    }

    /// Sends once `label` is sendable. Fails with
    /// [`SessionError::ChannelNeverReady`] if the session closes first.
    pub fn send(&self, transport: &dyn Transport, label: &str, payload: &[u8]) -> Result<()> {
        self.wait_sendable(label)?;
        transport.send_data_channel(label, payload)?;
        debug!("Sent {} bytes on '{}'", payload.len(), label);
        Ok(())
    }
}
