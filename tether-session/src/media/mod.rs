mod audio_pull;
mod audio_ring;
mod frame_queue;

pub use audio_pull::*;
pub use audio_ring::*;
pub use frame_queue::*;
