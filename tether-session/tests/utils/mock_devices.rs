use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tether_core::{AudioFormat, DeviceError, MediaFrame, VideoFrame};
use tether_session::{AudioCallback, AudioInput, DisplayControl, VideoCapture, VideoDisplay};

/// Capture that yields `frames` small frames, with every `skip_every`th read
/// failing, then reports itself closed.
pub struct ScriptedCapture {
    remaining: usize,
    reads: usize,
    skip_every: Option<usize>,
}

impl ScriptedCapture {
    pub fn new(frames: usize) -> Self {
        Self {
            remaining: frames,
            reads: 0,
            skip_every: None,
        }
    }

    pub fn skipping_every(mut self, n: usize) -> Self {
        self.skip_every = Some(n);
        self
    }
}

impl VideoCapture for ScriptedCapture {
    fn read(&mut self) -> Result<Option<VideoFrame>, DeviceError> {
        self.reads += 1;
        if self.skip_every.is_some_and(|n| self.reads % n == 0) {
            return Ok(None);
        }
        if self.remaining == 0 {
            return Err(DeviceError::Failed {
                reason: "read past end".into(),
            });
        }
        self.remaining -= 1;
        Ok(Some(VideoFrame::new(4, 2, Bytes::from(vec![0u8; 24]))))
    }

    fn is_open(&self) -> bool {
        self.remaining > 0
    }
}

/// Display that counts frames and optionally quits after `quit_after`.
#[derive(Default)]
pub struct CountingDisplay {
    pub shown: usize,
    pub quit_after: Option<usize>,
}

impl CountingDisplay {
    pub fn quitting_after(frames: usize) -> Self {
        Self {
            shown: 0,
            quit_after: Some(frames),
        }
    }
}

impl VideoDisplay for CountingDisplay {
    fn show(&mut self, frame: &MediaFrame<VideoFrame>) -> Result<DisplayControl, DeviceError> {
        assert!(frame.payload.is_complete());
        self.shown += 1;
        match self.quit_after {
            Some(limit) if self.shown >= limit => Ok(DisplayControl::Quit),
            _ => Ok(DisplayControl::Continue),
        }
    }
}

/// Audio input whose push callback the test drives by hand.
#[derive(Clone, Default)]
pub struct ManualAudioInput {
    callback: Arc<Mutex<Option<AudioCallback>>>,
}

/// Dropping the stream detaches the callback.
pub struct ManualStream {
    callback: Arc<Mutex<Option<AudioCallback>>>,
}

impl Drop for ManualStream {
    fn drop(&mut self) {
        self.callback.lock().take();
    }
}

impl ManualAudioInput {
    /// Pushes one block. Returns false once the stream was released.
    pub fn push(&self, samples: &[i16]) -> bool {
        match self.callback.lock().as_mut() {
            Some(callback) => {
                callback(samples);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.callback.lock().is_some()
    }
}

impl AudioInput for ManualAudioInput {
    type Stream = ManualStream;

    fn start(
        &mut self,
        _format: AudioFormat,
        callback: AudioCallback,
    ) -> Result<ManualStream, DeviceError> {
        *self.callback.lock() = Some(callback);
        Ok(ManualStream {
            callback: Arc::clone(&self.callback),
        })
    }
}
