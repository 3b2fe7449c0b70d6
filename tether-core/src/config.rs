use crate::error::ConfigError;
use crate::model::DataChannelSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 10_000;

/// Media role requested from the signaling peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sendonly,
    Recvonly,
    Sendrecv,
}

impl Role {
    pub fn sends_media(self) -> bool {
        matches!(self, Self::Sendonly | Self::Sendrecv)
    }

    pub fn receives_media(self) -> bool {
        matches!(self, Self::Recvonly | Self::Sendrecv)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Sendrecv
    }
}

/// PCM layout shared by capture, the transport audio track and playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

impl AudioFormat {
    /// Interleaved samples needed for `frames` frames.
    pub fn samples_for(&self, frames: usize) -> usize {
        frames * self.channels as usize
    }

    /// Frames covering `period` at this sample rate.
    pub fn frames_in(&self, period: Duration) -> usize {
        (self.sample_rate as u128 * period.as_micros() / 1_000_000) as usize
    }
}

/// Hints passed through to the transport's video encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub codec_type: Option<String>,
    /// kbps
    pub bit_rate: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            codec_type: None,
            bit_rate: 500,
            width: None,
            height: None,
        }
    }
}

/// Everything needed to create and run one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub signaling_urls: Vec<String>,
    pub channel_id: String,
    pub metadata: Option<serde_json::Value>,
    pub role: Role,
    pub audio: bool,
    pub video: bool,
    pub data_channels: Vec<DataChannelSpec>,
    pub data_channel_signaling: Option<bool>,
    pub connection_timeout_ms: u64,
    pub audio_format: AudioFormat,
    pub audio_codec_type: Option<String>,
    pub video_settings: VideoSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            signaling_urls: Vec::new(),
            channel_id: String::new(),
            metadata: None,
            role: Role::Sendrecv,
            audio: true,
            video: true,
            data_channels: Vec::new(),
            data_channel_signaling: None,
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            audio_format: AudioFormat::default(),
            audio_codec_type: None,
            video_settings: VideoSettings::default(),
        }
    }
}

impl SessionConfig {
    pub fn new(signaling_urls: Vec<String>, channel_id: impl Into<String>, role: Role) -> Self {
        Self {
            signaling_urls,
            channel_id: channel_id.into(),
            role,
            ..Default::default()
        }
    }

    /// Data-channel only session: no audio or video tracks, signaling over the channels.
    pub fn messaging(
        signaling_urls: Vec<String>,
        channel_id: impl Into<String>,
        data_channels: Vec<DataChannelSpec>,
    ) -> Self {
        Self {
            audio: false,
            video: false,
            data_channels,
            data_channel_signaling: Some(true),
            ..Self::new(signaling_urls, channel_id, Role::Sendrecv)
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn channel(&self, label: &str) -> Option<&DataChannelSpec> {
        self.data_channels.iter().find(|spec| spec.label == label)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signaling_urls.is_empty() {
            return Err(ConfigError::Missing {
                field: "signaling_urls",
            });
        }
        if let Some(url) = self.signaling_urls.iter().find(|u| u.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "signaling_urls",
                reason: format!("empty url {:?}", url),
            });
        }
        if self.channel_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "channel_id",
            });
        }
        if self.connection_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "connection_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.audio_format.sample_rate == 0 || self.audio_format.channels == 0 {
            return Err(ConfigError::Invalid {
                field: "audio_format",
                reason: "sample rate and channel count must be non-zero".into(),
            });
        }

        let mut seen = HashSet::new();
        for spec in &self.data_channels {
            if spec.label.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "data_channels",
                    reason: "empty label".into(),
                });
            }
            if !seen.insert(spec.label.as_str()) {
                return Err(ConfigError::Invalid {
                    field: "data_channels",
                    reason: format!("duplicate label {}", spec.label),
                });
            }
        }

        Ok(())
    }
}
