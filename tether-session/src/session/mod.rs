mod devices;
mod orchestrator;
mod session;
mod session_events;
mod shutdown;

pub use devices::*;
pub use orchestrator::*;
pub use session::*;
pub use session_events::*;
pub use shutdown::*;
