use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tether_core::{AudioFormat, DeviceError, MediaFrame, VideoFrame};
use tether_session::{
    AudioCallback, AudioInput, AudioOutput, AudioPullAdapter, DisplayControl, Tone, VideoCapture,
    VideoDisplay, pattern_frame,
};
use tracing::{debug, info};

/// Period of the simulated audio devices.
pub const AUDIO_PERIOD: Duration = Duration::from_millis(10);

/// Background thread standing in for a device stream; stops when dropped.
pub struct DeviceThread {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DeviceThread {
    fn spawn(name: &str, mut tick: impl FnMut() + Send + 'static) -> Result<Self, DeviceError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let mut next = Instant::now();
                while flag.load(Ordering::Relaxed) {
                    tick();
                    next += AUDIO_PERIOD;
                    thread::sleep(next.saturating_duration_since(Instant::now()));
                }
            })
            .map_err(|e| DeviceError::Failed {
                reason: e.to_string(),
            })?;
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }
}

impl Drop for DeviceThread {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Paced test pattern in place of a camera.
pub struct TestPatternCapture {
    width: u32,
    height: u32,
    interval: Duration,
    next_at: Instant,
    tick: u64,
    remaining: Option<u64>,
}

impl TestPatternCapture {
    pub fn new(width: u32, height: u32, fps: u32, frames: Option<u64>) -> Self {
        Self {
            width,
            height,
            interval: Duration::from_secs(1) / fps.max(1),
            next_at: Instant::now(),
            tick: 0,
            remaining: frames,
        }
    }
}

impl VideoCapture for TestPatternCapture {
    fn read(&mut self) -> Result<Option<VideoFrame>, DeviceError> {
        thread::sleep(self.next_at.saturating_duration_since(Instant::now()));
        self.next_at += self.interval;

        let frame = pattern_frame(self.width, self.height, self.tick);
        self.tick += 1;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        Ok(Some(frame))
    }

    fn is_open(&self) -> bool {
        self.remaining != Some(0)
    }
}

/// Logs frames instead of drawing them.
pub struct LogDisplay {
    every: u64,
    shown: u64,
}

impl LogDisplay {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            shown: 0,
        }
    }
}

impl VideoDisplay for LogDisplay {
    fn show(&mut self, frame: &MediaFrame<VideoFrame>) -> Result<DisplayControl, DeviceError> {
        self.shown += 1;
        if self.shown % self.every == 0 {
            info!(
                "Frame #{} {}x{} ({} bytes, {:?} in queue)",
                self.shown,
                frame.payload.width,
                frame.payload.height,
                frame.payload.data.len(),
                frame.age()
            );
        }
        Ok(DisplayControl::Continue)
    }
}

/// Output device pulling one period at a time on its own clock.
pub struct ClockedAudioOutput;

impl AudioOutput for ClockedAudioOutput {
    type Stream = DeviceThread;

    fn start(&mut self, adapter: Arc<AudioPullAdapter>) -> Result<DeviceThread, DeviceError> {
        let format = adapter.format();
        let mut buffer = vec![0i16; format.samples_for(format.frames_in(AUDIO_PERIOD))];
        let mut pulls = 0u64;
        DeviceThread::spawn("audio-output", move || {
            adapter.fill(&mut buffer);
            pulls += 1;
            if pulls % 100 == 0 {
                let peak = buffer.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
                debug!("Playback peak {} ({:?})", peak, adapter.stats());
            }
        })
    }
}

/// Input device producing a sine tone.
pub struct ToneAudioInput {
    pub hz: f32,
}

impl AudioInput for ToneAudioInput {
    type Stream = DeviceThread;

    fn start(
        &mut self,
        format: AudioFormat,
        mut callback: AudioCallback,
    ) -> Result<DeviceThread, DeviceError> {
        let mut tone = Tone::new(format, self.hz);
        DeviceThread::spawn("audio-input", move || callback(&tone.next(AUDIO_PERIOD)))
    }
}
