use bytes::Bytes;
use std::time::{Duration, Instant};

/// A payload handed from the transport's delivery context to a consumer loop,
/// stamped with the moment it arrived.
#[derive(Debug, Clone)]
pub struct MediaFrame<T> {
    pub payload: T,
    pub arrived_at: Instant,
}

impl<T> MediaFrame<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            arrived_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.arrived_at.elapsed()
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

/// Packed 8-bit BGR image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

impl VideoFrame {
    pub const BYTES_PER_PIXEL: usize = 3;

    pub fn new(width: u32, height: u32, data: Bytes) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * Self::BYTES_PER_PIXEL
    }

    pub fn is_complete(&self) -> bool {
        self.data.len() == self.expected_len()
    }
}

/// A message received on a data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMessage {
    pub label: String,
    pub payload: Bytes,
}

impl DataMessage {
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
