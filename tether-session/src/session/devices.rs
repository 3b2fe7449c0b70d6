use crate::media::AudioPullAdapter;
use std::sync::Arc;
use tether_core::{AudioFormat, DeviceError, MediaFrame, VideoFrame};

/// Push callback handed to an audio input stream.
pub type AudioCallback = Box<dyn FnMut(&[i16]) + Send>;

/// A camera-like frame source.
pub trait VideoCapture {
    /// Blocks for the next frame. `Ok(None)` means this read failed and should be skipped.
    fn read(&mut self) -> Result<Option<VideoFrame>, DeviceError>;

    fn is_open(&self) -> bool;
}

/// What a display asks the receive loop to do after showing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayControl {
    Continue,
    Quit,
}

pub trait VideoDisplay {
    fn show(&mut self, frame: &MediaFrame<VideoFrame>) -> Result<DisplayControl, DeviceError>;
}

/// Microphone-like device. The returned stream runs until dropped.
pub trait AudioInput {
    type Stream;

    fn start(
        &mut self,
        format: AudioFormat,
        callback: AudioCallback,
    ) -> Result<Self::Stream, DeviceError>;
}

/// Speaker-like device pulling from the adapter at its own cadence until the
/// stream is dropped.
pub trait AudioOutput {
    type Stream;

    fn start(&mut self, adapter: Arc<AudioPullAdapter>) -> Result<Self::Stream, DeviceError>;
}

/// Stands in for an absent audio device.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAudio;

impl AudioInput for NoAudio {
    type Stream = ();

    fn start(&mut self, _: AudioFormat, _: AudioCallback) -> Result<(), DeviceError> {
        Ok(())
    }
}

impl AudioOutput for NoAudio {
    type Stream = ();

    fn start(&mut self, _: Arc<AudioPullAdapter>) -> Result<(), DeviceError> {
        Ok(())
    }
}
