use crate::transport::Transport;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tether_core::{
    ConnectionId, ConnectionState, DisconnectReason, Result, SessionError, SignalingEvent,
};
use tracing::{debug, info, warn};

struct LifecycleInner {
    state: ConnectionState,
    connection_id: Option<ConnectionId>,
    switched: bool,
    disconnect_reason: Option<DisconnectReason>,
    /// The transport connect was issued and nothing has torn it down yet.
    transport_open: bool,
    interrupted: bool,
}

/// Correlates this client's connection id with the asynchronous
/// `connection.created` / disconnect notifications.
///
/// All state lives behind one mutex; every transition wakes `changed`.
pub struct ConnectionLifecycle {
    inner: Mutex<LifecycleInner>,
    changed: Condvar,
    timeout: Duration,
}

impl ConnectionLifecycle {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(LifecycleInner {
                state: ConnectionState::Idle,
                connection_id: None,
                switched: false,
                disconnect_reason: None,
                transport_open: false,
                interrupted: false,
            }),
            changed: Condvar::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issues the transport connect and blocks until our own `connection.created`
    /// arrives, the session is closed, or the timeout elapses.
    ///
    /// A timed out session ends up `Disconnected` but still owes the transport a
    /// teardown, which the next [`disconnect`](Self::disconnect) performs.
    pub fn connect(&self, transport: &dyn Transport) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if inner.state != ConnectionState::Idle {
                return Err(SessionError::InvalidState {
                    operation: "connect",
                    state: inner.state,
                });
            }
            if inner.interrupted {
                inner.state = ConnectionState::Disconnected;
                self.changed.notify_all();
                return Err(SessionError::Closed);
            }
            inner.state = ConnectionState::Connecting;
            inner.transport_open = true;
        }

        debug!("Issuing transport connect (timeout {:?})", self.timeout);
        if let Err(e) = transport.connect() {
            let mut inner = self.inner.lock();
            inner.transport_open = false;
            inner.state = ConnectionState::Disconnected;
            self.changed.notify_all();
            return Err(e.into());
        }

        self.wait_connected()
    }

    fn wait_connected(&self) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        let mut inner = self.inner.lock();

        loop {
            match inner.state {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Disconnected => {
                    return Err(match &inner.disconnect_reason {
                        Some(reason) => SessionError::TransportDisconnect {
                            error_code: reason.error_code,
                            message: reason.message.clone(),
                        },
                        None => SessionError::Closed,
                    });
                }
                ConnectionState::Idle | ConnectionState::Connecting => {}
            }

            if inner.interrupted {
                debug!("Connect interrupted");
                inner.state = ConnectionState::Disconnected;
                self.changed.notify_all();
                return Err(SessionError::Closed);
            }

            if self.changed.wait_until(&mut inner, deadline).timed_out()
                && inner.state == ConnectionState::Connecting
            {
                warn!(
                    "Connection not established within {:?} (connection_id={:?})",
                    self.timeout, inner.connection_id
                );
                inner.state = ConnectionState::Disconnected;
                self.changed.notify_all();
                return Err(SessionError::ConnectionTimeout {
                    timeout: self.timeout,
                });
            }
        }
    }

    /// Applies one signaling event. The only mutation entry point for
    /// notification-delivery contexts.
    ///
    /// Events that do not fit the current state come back as
    /// [`SessionError::UnexpectedEvent`]; the caller logs them, nothing else changes.
    pub fn on_event(&self, event: &SignalingEvent) -> Result<()> {
        let mut inner = self.inner.lock();

        match event {
            SignalingEvent::OfferAssigned { connection_id } => {
                if inner.state.is_terminal() || inner.connection_id.is_some() {
                    return Err(SessionError::UnexpectedEvent {
                        event: event.name(),
                        state: inner.state,
                    });
                }
                debug!("Offer assigned connection_id={}", connection_id);
                inner.connection_id = Some(connection_id.clone());
            }

            SignalingEvent::PeerNotification { connection_id, .. } => {
                if !event.is_connection_created() {
                    return Ok(());
                }
                let Some(own) = inner.connection_id.as_ref() else {
                    debug!("connection.created before our offer, ignoring");
                    return Ok(());
                };
                if connection_id.as_ref() != Some(own) {
                    debug!("connection.created for another peer {:?}", connection_id);
                    return Ok(());
                }

                match inner.state {
                    ConnectionState::Connecting => {
                        info!("Connected: connection_id={}", own);
                        inner.state = ConnectionState::Connected;
                        self.changed.notify_all();
                    }
                    ConnectionState::Connected => {}
                    state => {
                        return Err(SessionError::UnexpectedEvent {
                            event: event.name(),
                            state,
                        });
                    }
                }
            }

            SignalingEvent::Switched => {
                if !inner.state.is_terminal() {
                    inner.switched = true;
                }
            }

            SignalingEvent::DisconnectNotice {
                error_code,
                message,
            } => {
                let reason = DisconnectReason {
                    error_code: *error_code,
                    message: message.clone(),
                };
                inner.transport_open = false;
                if inner.disconnect_reason.is_none() {
                    inner.disconnect_reason = Some(reason.clone());
                }
                if inner.state.is_terminal() {
                    debug!("Disconnect notice after close: {}", reason);
                    return Ok(());
                }
                info!("Disconnected by transport: {}", reason);
                inner.state = ConnectionState::Disconnected;
                self.changed.notify_all();
            }

            SignalingEvent::MessageReceived { .. }
            | SignalingEvent::DataChannelOpened { .. }
            | SignalingEvent::Ignored => {}
        }

        Ok(())
    }

    /// Tears the session down. Safe from any thread, any number of times; only
    /// the first call that finds the transport open issues the transport disconnect.
    ///
    /// Returns whether this call changed anything.
    pub fn disconnect(&self, transport: &dyn Transport) -> bool {
        let issue_transport = {
            let mut inner = self.inner.lock();
            let issue = std::mem::replace(&mut inner.transport_open, false);
            if inner.state.is_terminal() && !issue {
                return false;
            }
            inner.state = ConnectionState::Disconnected;
            self.changed.notify_all();
            issue
        };

        if issue_transport {
            debug!("Issuing transport disconnect");
            if let Err(e) = transport.disconnect() {
                warn!("Transport disconnect failed: {}", e);
            }
        }
        true
    }

    /// Cuts a pending or future [`connect`](Self::connect) short with
    /// [`SessionError::Closed`]. Never calls the transport; a connect that was
    /// already issued is still torn down by the next `disconnect`.
    pub fn interrupt(&self) {
        let mut inner = self.inner.lock();
        if !inner.interrupted {
            inner.interrupted = true;
            self.changed.notify_all();
        }
    }

    /// Blocks until the session is closed or `timeout` elapses. Returns `is_closed()`.
    pub fn wait_closed(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        while !inner.state.is_terminal() {
            if self.changed.wait_until(&mut inner, deadline).timed_out() {
                break;
            }
        }
        inner.state.is_terminal()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn is_closed(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn is_switched(&self) -> bool {
        self.inner.lock().switched
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.inner.lock().connection_id.clone()
    }

    pub fn disconnect_reason(&self) -> Option<DisconnectReason> {
        self.inner.lock().disconnect_reason.clone()
    }
}
