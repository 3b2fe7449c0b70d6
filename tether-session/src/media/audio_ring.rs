use rtrb::{Consumer, Producer, RingBuffer};
use std::time::Duration;
use tether_core::AudioFormat;
use tracing::debug;

use crate::media::AudioSink;

/// Creates a wait-free SPSC sample ring holding `capacity` interleaved samples.
pub fn audio_ring(capacity: usize) -> (AudioWriter, RingAudioSink) {
    let (producer, consumer) = RingBuffer::new(capacity.max(1));
    (
        AudioWriter {
            producer,
            dropped: 0,
        },
        RingAudioSink { consumer },
    )
}

/// Ring sized to buffer `period` of audio in `format`.
pub fn audio_ring_for(format: AudioFormat, period: Duration) -> (AudioWriter, RingAudioSink) {
    audio_ring(format.samples_for(format.frames_in(period)))
}

/// Producer half, fed by the transport's decoded audio track.
pub struct AudioWriter {
    producer: Producer<i16>,
    dropped: u64,
}

impl AudioWriter {
    /// Writes as many samples as fit. Overflow is dropped, never waited on.
    pub fn write(&mut self, samples: &[i16]) -> usize {
        let mut written = 0;
        for &sample in samples {
            if self.producer.push(sample).is_err() {
                break;
            }
            written += 1;
        }

        let overflow = samples.len() - written;
        if overflow > 0 {
            self.dropped += overflow as u64;
            debug!(
                "Audio ring full, dropped {} samples ({} total)",
                overflow, self.dropped
            );
        }
        written
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Whether the reading half was dropped.
    pub fn is_abandoned(&self) -> bool {
        self.producer.is_abandoned()
    }
}

/// Consumer half, read from the real-time pull callback.
pub struct RingAudioSink {
    consumer: Consumer<i16>,
}

impl RingAudioSink {
    pub fn available(&self) -> usize {
        self.consumer.slots()
    }
}

impl AudioSink for RingAudioSink {
    fn read(&mut self, out: &mut [i16]) -> usize {
        let n = out.len().min(self.consumer.slots());
        if n == 0 {
            return 0;
        }

        match self.consumer.read_chunk(n) {
            Ok(chunk) => {
                let (first, second) = chunk.as_slices();
                out[..first.len()].copy_from_slice(first);
                out[first.len()..first.len() + second.len()].copy_from_slice(second);
                chunk.commit_all();
                n
            }
            Err(_) => 0,
        }
    }
}
