mod channel;
mod lifecycle;
mod media;
mod session;
mod transport;

pub use channel::*;
pub use lifecycle::*;
pub use media::*;
pub use session::*;
pub use transport::*;
