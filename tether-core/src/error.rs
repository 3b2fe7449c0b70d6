use crate::model::ConnectionState;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection was not established within {timeout:?}")]
    ConnectionTimeout { timeout: Duration },

    #[error("Data channel '{label}' never became sendable before the session closed")]
    ChannelNeverReady { label: String },

    #[error("Data channel '{label}' is not configured for sending")]
    ChannelNotSendable { label: String },

    #[error("Unexpected {event} event while {state}")]
    UnexpectedEvent {
        event: &'static str,
        state: ConnectionState,
    },

    #[error("Disconnected by transport: error_code='{error_code}' message='{message}'")]
    TransportDisconnect { error_code: i32, message: String },

    #[error("Session closed before the connection was established")]
    Closed,

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: ConnectionState,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Configuration invalid: {0}")]
    Config(#[from] ConfigError),
}

/// Failures reported by the transport collaborator.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connect failed: {reason}")]
    ConnectFailed { reason: String },

    #[error("Send on '{label}' failed: {reason}")]
    SendFailed { label: String, reason: String },

    #[error("Media delivery failed: {reason}")]
    MediaFailed { reason: String },

    #[error("Transport is closed")]
    Closed,

    #[error("Stats unavailable: {reason}")]
    Stats { reason: String },
}

/// Failures reported by capture/playback devices.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Device unavailable: {device}")]
    Unavailable { device: String },

    #[error("Device failed: {reason}")]
    Failed { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing {field}")]
    Missing { field: &'static str },

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
