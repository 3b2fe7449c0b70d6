use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tether_core::AudioFormat;
use tracing::{debug, info};

/// Source of decoded playback samples.
pub trait AudioSink: Send {
    /// Copies up to `out.len()` interleaved samples without blocking and
    /// returns how many were written.
    fn read(&mut self, out: &mut [i16]) -> usize;
}

/// Counters kept by [`AudioPullAdapter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullStats {
    pub pulls: u64,
    pub short_reads: u64,
    pub silent_samples: u64,
}

/// Services the audio device's periodic pull callback from a sink that fills
/// asynchronously.
///
/// The callback side never waits for the lock: if the sink is being swapped
/// at that instant the period is rendered as silence.
pub struct AudioPullAdapter {
    format: AudioFormat,
    sink: Mutex<Option<Box<dyn AudioSink>>>,
    pulls: AtomicU64,
    short_reads: AtomicU64,
    silent_samples: AtomicU64,
}

impl AudioPullAdapter {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            sink: Mutex::new(None),
            pulls: AtomicU64::new(0),
            short_reads: AtomicU64::new(0),
            silent_samples: AtomicU64::new(0),
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Installs (or replaces) the sink the pull callback reads from.
    pub fn install_sink(&self, sink: Box<dyn AudioSink>) {
        let previous = self.sink.lock().replace(sink);
        if previous.is_some() {
            info!("Replaced audio sink");
        }
    }

    pub fn has_sink(&self) -> bool {
        self.sink.lock().is_some()
    }

    /// Returns exactly `frame_count` frames of interleaved samples, padding
    /// whatever the sink could not supply with silence.
    ///
    /// Allocates on every call; device callbacks should use [`fill`](Self::fill)
    /// with their own buffer instead.
    pub fn on_pull_requested(&self, frame_count: usize) -> Vec<i16> {
        let mut out = vec![0i16; self.format.samples_for(frame_count)];
        self.fill(&mut out);
        out
    }

    /// Fills `out` completely and returns how many samples came from the sink.
    pub fn fill(&self, out: &mut [i16]) -> usize {
        let read = match self.sink.try_lock() {
            Some(mut guard) => match guard.as_mut() {
                Some(sink) => sink.read(out).min(out.len()),
                None => 0,
            },
            None => 0,
        };

        out[read..].fill(0);
        self.pulls.fetch_add(1, Ordering::Relaxed);

        let missing = out.len() - read;
        if missing > 0 {
            self.short_reads.fetch_add(1, Ordering::Relaxed);
            self.silent_samples
                .fetch_add(missing as u64, Ordering::Relaxed);
            debug!(
                "Audio underrun: requested {} samples, sink had {}",
                out.len(),
                read
            );
        }
        read
    }

    pub fn stats(&self) -> PullStats {
        PullStats {
            pulls: self.pulls.load(Ordering::Relaxed),
            short_reads: self.short_reads.load(Ordering::Relaxed),
            silent_samples: self.silent_samples.load(Ordering::Relaxed),
        }
    }
}
