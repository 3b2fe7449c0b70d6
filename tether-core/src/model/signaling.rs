use crate::model::connection::ConnectionId;
use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, warn};

/// `event_type` of the notification announcing that a connection joined the channel.
pub const CONNECTION_CREATED: &str = "connection.created";

/// Everything the session reacts to, decoded from one transport notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingEvent {
    /// `{"type": "offer"}` carrying this client's own connection id.
    OfferAssigned { connection_id: ConnectionId },

    /// `{"type": "notify"}` fanned out for any connection in the channel.
    PeerNotification {
        event_type: String,
        connection_id: Option<ConnectionId>,
    },

    /// `{"type": "switched"}`: signaling moved onto the data channels.
    Switched,

    /// The transport closed the session.
    DisconnectNotice { error_code: i32, message: String },

    MessageReceived { label: String, payload: Bytes },

    /// The transport confirmed that a data channel is open.
    DataChannelOpened { label: String },

    /// A message type this client does not act on.
    Ignored,
}

impl SignalingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OfferAssigned { .. } => "offer",
            Self::PeerNotification { .. } => "notify",
            Self::Switched => "switched",
            Self::DisconnectNotice { .. } => "disconnect",
            Self::MessageReceived { .. } => "message",
            Self::DataChannelOpened { .. } => "data_channel",
            Self::Ignored => "ignored",
        }
    }

    pub fn is_connection_created(&self) -> bool {
        matches!(self, Self::PeerNotification { event_type, .. } if event_type == CONNECTION_CREATED)
    }
}

#[derive(Deserialize)]
struct RawSignal {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(alias = "connectionId")]
    connection_id: Option<String>,
    event_type: Option<String>,
}

/// Decodes a raw JSON signaling payload.
///
/// Malformed input and message types outside offer/notify/switched decode to
/// [`SignalingEvent::Ignored`]; the signaling channel carries many messages this
/// client has no use for.
pub fn decode(raw: impl AsRef<[u8]>) -> SignalingEvent {
    let raw = raw.as_ref();
    let msg: RawSignal = match serde_json::from_slice(raw) {
        Ok(m) => m,
        Err(e) => {
            warn!(
                "Malformed signaling message ({} bytes): {}",
                raw.len(),
                e
            );
            return SignalingEvent::Ignored;
        }
    };

    match msg.kind.as_deref() {
        Some("offer") => match msg.connection_id {
            Some(id) => SignalingEvent::OfferAssigned {
                connection_id: ConnectionId(id),
            },
            None => {
                debug!("Offer without connection_id, ignoring");
                SignalingEvent::Ignored
            }
        },
        Some("notify") => match msg.event_type {
            Some(event_type) => SignalingEvent::PeerNotification {
                event_type,
                connection_id: msg.connection_id.map(ConnectionId),
            },
            None => SignalingEvent::Ignored,
        },
        Some("switched") => SignalingEvent::Switched,
        other => {
            debug!("Ignoring signaling message of type {:?}", other);
            SignalingEvent::Ignored
        }
    }
}
