mod connection_lifecycle;

pub use connection_lifecycle::*;
