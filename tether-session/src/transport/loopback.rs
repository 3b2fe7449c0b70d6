use crate::media::{AudioWriter, FrameProducer};
use crate::session::{SessionEvents, TrackSink};
use crate::transport::{Connector, Transport};
use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use serde_json::json;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use tether_core::{
    AudioFormat, CONNECTION_CREATED, SessionConfig, TrackKind, TransportError, VideoFrame,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Error code reported when the session is closed on request.
pub const CLOSE_SUCCEEDED: i32 = 0;

/// Tuning for [`LoopbackTransport`].
#[derive(Debug, Clone)]
pub struct LoopbackOptions {
    /// Delay between `connect` and the offer.
    pub handshake_delay: Duration,
    /// Whether our own `connection.created` is ever sent.
    pub announce_peer: bool,
    /// Produce remote video and audio for receiving roles.
    pub synthesize_media: bool,
    pub frame_interval: Duration,
    pub frame_width: u32,
    pub frame_height: u32,
    pub tone_hz: f32,
    /// End the session from the remote side after this long.
    pub disconnect_after: Option<Duration>,
}

impl Default for LoopbackOptions {
    fn default() -> Self {
        Self {
            handshake_delay: Duration::from_millis(20),
            announce_peer: true,
            synthesize_media: true,
            frame_interval: Duration::from_millis(100),
            frame_width: 64,
            frame_height: 48,
            tone_hz: 440.0,
            disconnect_after: None,
        }
    }
}

/// Creates [`LoopbackTransport`]s.
#[derive(Debug, Clone, Default)]
pub struct LoopbackConnector {
    options: LoopbackOptions,
}

impl LoopbackConnector {
    pub fn new(options: LoopbackOptions) -> Self {
        Self { options }
    }
}

impl Connector for LoopbackConnector {
    fn create_connection(
        &self,
        config: &SessionConfig,
        events: SessionEvents,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        Ok(Arc::new(LoopbackTransport::new(
            config.clone(),
            self.options.clone(),
            events,
        )))
    }
}

#[derive(Default)]
struct Counters {
    messages_sent: AtomicU64,
    bytes_sent: AtomicU64,
    video_frames_sent: AtomicU64,
    audio_samples_sent: AtomicU64,
    video_frames_received: AtomicU64,
    audio_samples_received: AtomicU64,
}

struct LoopbackState {
    stopped: Mutex<bool>,
    wake: Condvar,
    disconnected: AtomicBool,
    counters: Counters,
}

impl LoopbackState {
    fn stop(&self) {
        let mut stopped = self.stopped.lock();
        *stopped = true;
        self.wake.notify_all();
    }

    fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleeps for `period` unless stopped first. Returns whether still running.
    fn sleep(&self, period: Duration) -> bool {
        let deadline = Instant::now() + period;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        !*stopped
    }
}

/// In-process transport playing the remote side of a session.
///
/// `connect` starts a worker that runs the signaling handshake, opens every
/// configured data channel and, for receiving roles, feeds synthetic video
/// and a sine tone into the session until disconnected. Payloads sent on a
/// channel that can also receive are echoed back.
pub struct LoopbackTransport {
    config: SessionConfig,
    options: LoopbackOptions,
    events: SessionEvents,
    state: Arc<LoopbackState>,
    worker: Mutex<Option<(ThreadId, JoinHandle<()>)>>,
    connection_id: String,
}

impl LoopbackTransport {
    pub fn new(config: SessionConfig, options: LoopbackOptions, events: SessionEvents) -> Self {
        Self {
            config,
            options,
            events,
            state: Arc::new(LoopbackState {
                stopped: Mutex::new(false),
                wake: Condvar::new(),
                disconnected: AtomicBool::new(false),
                counters: Counters::default(),
            }),
            worker: Mutex::new(None),
            connection_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Reports the remote-side close once.
    fn notify_closed(state: &LoopbackState, events: &SessionEvents, message: &str) {
        if !state.disconnected.swap(true, Ordering::SeqCst) {
            events.on_disconnect(CLOSE_SUCCEEDED, message);
        }
    }
}

impl Transport for LoopbackTransport {
    fn connect(&self) -> Result<(), TransportError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(TransportError::ConnectFailed {
                reason: "already connected".into(),
            });
        }

        let remote = Remote {
            config: self.config.clone(),
            options: self.options.clone(),
            events: self.events.clone(),
            state: Arc::clone(&self.state),
            connection_id: self.connection_id.clone(),
        };
        let handle = thread::Builder::new()
            .name("loopback-transport".into())
            .spawn(move || remote.run())
            .map_err(|e| TransportError::ConnectFailed {
                reason: e.to_string(),
            })?;

        info!("Loopback connecting to channel {}", self.config.channel_id);
        *worker = Some((handle.thread().id(), handle));
        Ok(())
    }

    fn disconnect(&self) -> Result<(), TransportError> {
        self.state.stop();

        let worker = self.worker.lock().take();
        if let Some((id, handle)) = worker {
            if id != thread::current().id() && handle.join().is_err() {
                warn!("Loopback worker panicked");
            }
        }

        Self::notify_closed(&self.state, &self.events, "disconnected");
        Ok(())
    }

    fn send_data_channel(&self, label: &str, payload: &[u8]) -> Result<(), TransportError> {
        if self.state.is_stopped() {
            return Err(TransportError::Closed);
        }
        let Some(spec) = self.config.channel(label) else {
            return Err(TransportError::SendFailed {
                label: label.to_owned(),
                reason: "no such data channel".into(),
            });
        };

        let counters = &self.state.counters;
        counters.messages_sent.fetch_add(1, Ordering::Relaxed);
        counters
            .bytes_sent
            .fetch_add(payload.len() as u64, Ordering::Relaxed);

        if spec.direction.can_receive() {
            self.events
                .on_message(label, Bytes::copy_from_slice(payload));
        }
        Ok(())
    }

    fn send_video_frame(&self, frame: &VideoFrame) -> Result<(), TransportError> {
        if self.state.is_stopped() {
            return Err(TransportError::Closed);
        }
        if !frame.is_complete() {
            return Err(TransportError::MediaFailed {
                reason: format!(
                    "frame {}x{} carries {} bytes, expected {}",
                    frame.width,
                    frame.height,
                    frame.data.len(),
                    frame.expected_len()
                ),
            });
        }
        self.state
            .counters
            .video_frames_sent
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn send_audio(&self, samples: &[i16]) -> Result<(), TransportError> {
        if self.state.is_stopped() {
            return Err(TransportError::Closed);
        }
        self.state
            .counters
            .audio_samples_sent
            .fetch_add(samples.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn stats(&self) -> Result<String, TransportError> {
        let c = &self.state.counters;
        let state = if self.state.is_stopped() {
            "closed"
        } else {
            "connected"
        };
        let report = json!([
            {
                "type": "transport",
                "id": self.connection_id,
                "state": state,
            },
            {
                "type": "data-channel",
                "messagesSent": c.messages_sent.load(Ordering::Relaxed),
                "bytesSent": c.bytes_sent.load(Ordering::Relaxed),
            },
            {
                "type": "outbound-rtp",
                "framesSent": c.video_frames_sent.load(Ordering::Relaxed),
                "audioSamplesSent": c.audio_samples_sent.load(Ordering::Relaxed),
            },
            {
                "type": "inbound-rtp",
                "framesReceived": c.video_frames_received.load(Ordering::Relaxed),
                "audioSamplesReceived": c.audio_samples_received.load(Ordering::Relaxed),
            },
        ]);
        Ok(report.to_string())
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        self.state.stop();
        if let Some((id, handle)) = self.worker.get_mut().take()
            && id != thread::current().id()
        {
            let _ = handle.join();
        }
    }
}

/// The worker's view: the remote peer driving notifications into the session.
struct Remote {
    config: SessionConfig,
    options: LoopbackOptions,
    events: SessionEvents,
    state: Arc<LoopbackState>,
    connection_id: String,
}

impl Remote {
    fn run(self) {
        if !self.state.sleep(self.options.handshake_delay) {
            return;
        }

        self.events.on_set_offer(
            &json!({
                "type": "offer",
                "sdp": "v=0",
                "connection_id": self.connection_id,
            })
            .to_string(),
        );
        self.events.on_notify(
            &json!({
                "type": "notify",
                "event_type": CONNECTION_CREATED,
                "connection_id": Uuid::new_v4().to_string(),
            })
            .to_string(),
        );
        if !self.options.announce_peer {
            debug!("Loopback withholding connection.created");
            while self.state.sleep(self.options.frame_interval) {}
            return;
        }
        self.events.on_notify(
            &json!({
                "type": "notify",
                "event_type": CONNECTION_CREATED,
                "connection_id": self.connection_id,
            })
            .to_string(),
        );

        if self.config.data_channel_signaling == Some(true) {
            self.events.on_switched(&json!({ "type": "switched" }).to_string());
        }
        for spec in &self.config.data_channels {
            self.events.on_data_channel(&spec.label);
        }

        let mut media = self.open_tracks();
        let started = Instant::now();
        let mut tick = 0u64;
        loop {
            if let Some(limit) = self.options.disconnect_after
                && started.elapsed() >= limit
            {
                info!("Loopback ending session after {:?}", limit);
                self.state.stop();
                LoopbackTransport::notify_closed(&self.state, &self.events, "session ended");
                return;
            }
            if !self.state.sleep(self.options.frame_interval) {
                return;
            }
            self.deliver(&mut media, tick);
            tick += 1;
        }
    }

    fn open_tracks(&self) -> RemoteMedia {
        let mut media = RemoteMedia::default();
        if !self.config.role.receives_media() || !self.options.synthesize_media {
            return media;
        }
        if self.config.video {
            if let TrackSink::Video(producer) = self.events.on_track(TrackKind::Video) {
                media.video = Some(producer);
            }
        }
        if self.config.audio {
            if let TrackSink::Audio(writer) = self.events.on_track(TrackKind::Audio) {
                media.audio = Some((writer, Tone::new(self.config.audio_format, self.options.tone_hz)));
            }
        }
        media
    }

    fn deliver(&self, media: &mut RemoteMedia, tick: u64) {
        let counters = &self.state.counters;

        if let Some(producer) = &media.video {
            let frame = pattern_frame(self.options.frame_width, self.options.frame_height, tick);
            if producer.push(frame) {
                counters.video_frames_received.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Some((writer, tone)) = &mut media.audio {
            let samples = tone.next(self.options.frame_interval);
            let written = writer.write(&samples);
            counters
                .audio_samples_received
                .fetch_add(written as u64, Ordering::Relaxed);
        }
    }
}

#[derive(Default)]
struct RemoteMedia {
    video: Option<FrameProducer<VideoFrame>>,
    audio: Option<(AudioWriter, Tone)>,
}

/// Sine generator with a continuous phase across blocks.
pub struct Tone {
    format: AudioFormat,
    step: f32,
    phase: f32,
}

impl Tone {
    pub fn new(format: AudioFormat, hz: f32) -> Self {
        Self {
            format,
            step: TAU * hz / format.sample_rate.max(1) as f32,
            phase: 0.0,
        }
    }

    /// Interleaved samples covering `period`.
    pub fn next(&mut self, period: Duration) -> Vec<i16> {
        let frames = self.format.frames_in(period);
        let channels = self.format.channels as usize;
        let mut out = Vec::with_capacity(frames * channels);
        for _ in 0..frames {
            let sample = (self.phase.sin() * i16::MAX as f32 * 0.25) as i16;
            out.extend(std::iter::repeat_n(sample, channels));
            self.phase = (self.phase + self.step) % TAU;
        }
        out
    }
}

/// BGR gradient that shifts with `tick`.
pub fn pattern_frame(width: u32, height: u32, tick: u64) -> VideoFrame {
    let mut data = Vec::with_capacity(width as usize * height as usize * VideoFrame::BYTES_PER_PIXEL);
    for y in 0..height {
        for x in 0..width {
            let shade = (x as u64 + y as u64 + tick * 4) as u8;
            data.extend_from_slice(&[shade, shade.wrapping_mul(2), 255 - shade]);
        }
    }
    VideoFrame::new(width, height, Bytes::from(data))
}
