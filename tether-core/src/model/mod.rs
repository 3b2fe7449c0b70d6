mod channel;
mod connection;
mod frame;
mod signaling;
mod track;

pub use channel::{DataChannelSpec, Direction};
pub use connection::{ConnectionId, ConnectionState, DisconnectReason};
pub use frame::{DataMessage, MediaFrame, VideoFrame};
pub use signaling::{CONNECTION_CREATED, SignalingEvent, decode};
pub use track::TrackKind;
