pub mod config;
pub mod error;
pub mod model;

pub use config::{AudioFormat, Role, SessionConfig, VideoSettings};
pub use error::{ConfigError, DeviceError, Result, SessionError, TransportError};
pub use model::*;
