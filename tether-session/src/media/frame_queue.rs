use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tether_core::MediaFrame;
use tracing::debug;

/// Result of a bounded [`MediaFrameQueue::pop`].
#[derive(Debug)]
pub enum Popped<T> {
    Frame(MediaFrame<T>),
    /// Nothing arrived within the timeout; the producer may still be alive.
    Empty,
    /// The producer side is gone and every queued frame has been handed out.
    Closed,
}

impl<T> Popped<T> {
    pub fn into_frame(self) -> Option<MediaFrame<T>> {
        match self {
            Self::Frame(frame) => Some(frame),
            Self::Empty | Self::Closed => None,
        }
    }
}

struct QueueInner<T> {
    frames: VecDeque<MediaFrame<T>>,
    closed: bool,
}

/// Unbounded FIFO handing frames from the transport's delivery context to one
/// consumer loop.
pub struct MediaFrameQueue<T> {
    inner: Mutex<QueueInner<T>>,
    available: Condvar,
}

impl<T> MediaFrameQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                frames: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueues a payload stamped with the current time. Never blocks.
    ///
    /// Returns `false` (dropping the payload) only once the queue is closed.
    pub fn push(&self, payload: T) -> bool {
        self.push_frame(MediaFrame::new(payload))
    }

    pub fn push_frame(&self, frame: MediaFrame<T>) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            debug!("Frame pushed after close, dropping");
            return false;
        }
        inner.frames.push_back(frame);
        self.available.notify_one();
        true
    }

    /// Waits up to `timeout` for the next frame.
    pub fn pop(&self, timeout: Duration) -> Popped<T> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        loop {
            if let Some(frame) = inner.frames.pop_front() {
                return Popped::Frame(frame);
            }
            if inner.closed {
                return Popped::Closed;
            }
            if self.available.wait_until(&mut inner, deadline).timed_out() {
                return match inner.frames.pop_front() {
                    Some(frame) => Popped::Frame(frame),
                    None if inner.closed => Popped::Closed,
                    None => Popped::Empty,
                };
            }
        }
    }

    pub fn try_pop(&self) -> Option<MediaFrame<T>> {
        self.inner.lock().frames.pop_front()
    }

    /// Signals that no more frames will arrive. Frames already queued can still be popped.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if !inner.closed {
            inner.closed = true;
            self.available.notify_all();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for MediaFrameQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Push-only handle to a queue, handed to the transport for one track.
pub struct FrameProducer<T> {
    queue: Arc<MediaFrameQueue<T>>,
}

impl<T> FrameProducer<T> {
    pub fn new(queue: Arc<MediaFrameQueue<T>>) -> Self {
        Self { queue }
    }

    pub fn push(&self, payload: T) -> bool {
        self.queue.push(payload)
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

impl<T> Clone for FrameProducer<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}
