use crate::media::{MediaFrameQueue, Popped};
use crate::session::{
    AudioInput, AudioOutput, DisplayControl, Session, Shutdown, VideoCapture, VideoDisplay,
};
use bytes::Bytes;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tether_core::{Result, SessionError};
use tracing::{debug, info, warn};

/// How long a run loop waits for input before re-checking shutdown and session state.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Interval between sends in periodic messaging.
pub const DEFAULT_MESSAGE_INTERVAL: Duration = Duration::from_secs(1);

const CAPTURE_RETRY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown was triggered.
    Interrupted,
    /// The display asked to quit.
    Quit,
    /// The outbox was closed and fully sent.
    Completed,
    /// The capture device closed.
    CaptureEnded,
    /// The session closed locally without a transport-reported reason.
    Closed,
    TransportDisconnect { error_code: i32, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub stop: StopReason,
    /// Video frames sent or displayed.
    pub frames: u64,
    pub messages_sent: u64,
}

impl RunOutcome {
    fn stopped(stop: StopReason) -> Self {
        Self {
            stop,
            frames: 0,
            messages_sent: 0,
        }
    }
}

/// Disconnects when dropped, so every exit path of a run loop tears the session down.
struct DisconnectGuard<'a> {
    session: &'a Session,
}

impl Drop for DisconnectGuard<'_> {
    fn drop(&mut self) {
        self.session.disconnect();
    }
}

/// Runs a [`Session`] from connect to disconnect for one of the client roles.
///
/// Each `run_*` starts its devices, connects, loops until shutdown, session
/// close or a loop-specific end, and disconnects exactly once on the way out,
/// before the devices are released. Triggering `shutdown` interrupts the
/// session, so a blocked connect or send returns promptly.
pub struct Orchestrator {
    session: Arc<Session>,
    shutdown: Shutdown,
    poll_interval: Duration,
}

impl Orchestrator {
    pub fn new(session: Arc<Session>, shutdown: Shutdown) -> Self {
        let bound: Weak<Session> = Arc::downgrade(&session);
        shutdown.on_trigger(move || {
            if let Some(session) = bound.upgrade() {
                session.interrupt();
            }
        });
        Self {
            session,
            shutdown,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Plays remote audio and hands remote video frames to `display`.
    pub fn run_recvonly<D, O>(&self, display: &mut D, output: &mut O) -> Result<RunOutcome>
    where
        D: VideoDisplay,
        O: AudioOutput,
    {
        let _stream = output.start(self.session.audio_output())?;
        let _guard = self.guard();
        if let Some(stop) = self.connect()? {
            return Ok(RunOutcome::stopped(stop));
        }

        let video = self.session.video_frames();
        let mut frames = 0;
        let stop = loop {
            if self.shutdown.is_triggered() {
                break StopReason::Interrupted;
            }
            match video.pop(self.poll_interval) {
                Popped::Frame(frame) => {
                    frames += 1;
                    if display.show(&frame)? == DisplayControl::Quit {
                        break StopReason::Quit;
                    }
                }
                Popped::Empty if self.session.is_closed() => break self.closed_reason(),
                Popped::Empty => {}
                Popped::Closed => break self.closed_reason(),
            }
        };

        info!("Receive loop finished after {} frames: {:?}", frames, stop);
        Ok(RunOutcome {
            stop,
            frames,
            messages_sent: 0,
        })
    }

    /// Streams `capture` and, when audio is enabled, `input` to the transport.
    pub fn run_sendonly<C, I>(&self, capture: &mut C, input: &mut I) -> Result<RunOutcome>
    where
        C: VideoCapture,
        I: AudioInput,
    {
        let transport = self.session.transport();
        let _stream = if self.session.config().audio {
            let audio_transport = Arc::clone(&transport);
            let stream = input.start(
                self.session.config().audio_format,
                Box::new(move |samples: &[i16]| {
                    if let Err(e) = audio_transport.send_audio(samples) {
                        debug!("Dropping captured audio: {}", e);
                    }
                }),
            )?;
            Some(stream)
        } else {
            None
        };

        let _guard = self.guard();
        if let Some(stop) = self.connect()? {
            return Ok(RunOutcome::stopped(stop));
        }

        let mut frames = 0;
        let stop = loop {
            if self.shutdown.is_triggered() {
                break StopReason::Interrupted;
            }
            if self.session.is_closed() {
                break self.closed_reason();
            }
            if !capture.is_open() {
                break StopReason::CaptureEnded;
            }

            let Some(frame) = capture.read()? else {
                self.shutdown.wait_timeout(CAPTURE_RETRY);
                continue;
            };
            match transport.send_video_frame(&frame) {
                Ok(()) => frames += 1,
                Err(_) if self.session.is_closed() => break self.closed_reason(),
                Err(e) => return Err(e.into()),
            }
        };

        info!("Send loop finished after {} frames: {:?}", frames, stop);
        Ok(RunOutcome {
            stop,
            frames,
            messages_sent: 0,
        })
    }

    /// Sends every payload pushed to `outbox` on `label` until the outbox is
    /// closed and drained.
    pub fn run_messaging(&self, label: &str, outbox: &MediaFrameQueue<Bytes>) -> Result<RunOutcome> {
        let _guard = self.guard();
        if let Some(stop) = self.connect()? {
            return Ok(RunOutcome::stopped(stop));
        }

        let mut messages_sent = 0;
        let stop = loop {
            if self.shutdown.is_triggered() {
                break StopReason::Interrupted;
            }
            match outbox.pop(self.poll_interval) {
                Popped::Frame(frame) => match self.session.send(label, frame.payload) {
                    Ok(()) => messages_sent += 1,
                    Err(SessionError::ChannelNeverReady { .. }) => break self.stop_reason(),
                    Err(e) => return Err(e),
                },
                Popped::Empty if self.session.is_closed() => break self.closed_reason(),
                Popped::Empty => {}
                Popped::Closed => break StopReason::Completed,
            }
        };

        info!("Messaging finished after {} messages: {:?}", messages_sent, stop);
        Ok(RunOutcome {
            stop,
            frames: 0,
            messages_sent,
        })
    }

    /// Every `interval`, sends `sender={sender_id}, no={n}` on each sendable channel.
    pub fn run_messaging_periodic(&self, sender_id: u32, interval: Duration) -> Result<RunOutcome> {
        let _guard = self.guard();
        if let Some(stop) = self.connect()? {
            return Ok(RunOutcome::stopped(stop));
        }

        let mut messages_sent = 0;
        let mut no = 0u64;
        let stop = loop {
            if self.session.is_closed() {
                break self.closed_reason();
            }

            let payload = format!("sender={}, no={}", sender_id, no);
            for label in self.session.sendable_labels() {
                match self.session.send(&label, &payload) {
                    Ok(()) => {
                        messages_sent += 1;
                        info!("Sent on '{}': {}", label, payload);
                    }
                    Err(e) => warn!("Send on '{}' failed: {}", label, e),
                }
            }
            no += 1;

            if self.shutdown.wait_timeout(interval) {
                break StopReason::Interrupted;
            }
        };

        Ok(RunOutcome {
            stop,
            frames: 0,
            messages_sent,
        })
    }

    /// Connects and waits for the session to close or shutdown.
    pub fn run_until_closed(&self) -> Result<RunOutcome> {
        let _guard = self.guard();
        if let Some(stop) = self.connect()? {
            return Ok(RunOutcome::stopped(stop));
        }

        let stop = loop {
            if self.session.wait_closed(self.poll_interval) {
                break self.closed_reason();
            }
            if self.shutdown.is_triggered() {
                break StopReason::Interrupted;
            }
        };
        Ok(RunOutcome::stopped(stop))
    }

    fn guard(&self) -> DisconnectGuard<'_> {
        DisconnectGuard {
            session: &self.session,
        }
    }

    /// Connects unless shutdown already fired. A connect cut short by shutdown
    /// is reported as a stop, not an error.
    fn connect(&self) -> Result<Option<StopReason>> {
        if self.shutdown.is_triggered() {
            return Ok(Some(StopReason::Interrupted));
        }
        match self.session.connect() {
            Ok(()) => Ok(None),
            Err(e) if self.shutdown.is_triggered() => {
                debug!("Connect interrupted: {}", e);
                Ok(Some(StopReason::Interrupted))
            }
            Err(e) => Err(e),
        }
    }

    /// Why the loop ended when the session stopped accepting work.
    fn stop_reason(&self) -> StopReason {
        if self.shutdown.is_triggered() {
            StopReason::Interrupted
        } else {
            self.closed_reason()
        }
    }

    fn closed_reason(&self) -> StopReason {
        match self.session.disconnect_reason() {
            Some(reason) => StopReason::TransportDisconnect {
                error_code: reason.error_code,
                message: reason.message,
            },
            None => StopReason::Closed,
        }
    }
}
