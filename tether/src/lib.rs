pub use tether_core::{ConnectionId, Result, SessionConfig, SessionError};

pub mod model {
    pub use tether_core::model::*;
}

pub mod config {
    pub use tether_core::config::*;
}

pub mod error {
    pub use tether_core::error::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use tether_session::*;
}
