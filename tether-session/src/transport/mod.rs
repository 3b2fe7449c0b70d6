mod loopback;
mod transport;

pub use loopback::*;
pub use transport::*;
