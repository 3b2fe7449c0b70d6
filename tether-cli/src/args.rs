use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tether_core::config::DEFAULT_CONNECTION_TIMEOUT_MS;
use tether_core::{DataChannelSpec, Direction, Role, SessionConfig, VideoSettings};
use tether_session::LoopbackOptions;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Media and data-channel session client", version)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args)]
pub struct ConnectionArgs {
    /// Comma separated signaling URLs
    #[arg(long, env = "SORA_SIGNALING_URLS", value_delimiter = ',', required = true)]
    pub signaling_urls: Vec<String>,

    #[arg(long, env = "SORA_CHANNEL_ID")]
    pub channel_id: String,

    /// JSON object sent with the connect request
    #[arg(long, env = "SORA_METADATA")]
    pub metadata: Option<String>,

    #[arg(long, default_value_t = DEFAULT_CONNECTION_TIMEOUT_MS)]
    pub connection_timeout_ms: u64,

    /// Print the transport statistics when the run ends
    #[arg(long)]
    pub stats: bool,

    /// Have the loopback peer end the session after this many milliseconds
    #[arg(long)]
    pub disconnect_after_ms: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Data channels only: send typed lines, print what arrives
    Messaging {
        #[arg(long, env = "SORA_MESSAGING_LABEL", default_value = "#example")]
        label: String,

        /// JSON list of {"label", "direction"}; defaults to one sendrecv channel on --label
        #[arg(long, env = "SORA_DATA_CHANNELS")]
        data_channels: Option<String>,

        /// Send this payload on --label once, then disconnect
        #[arg(long, env = "SORA_SENDONLY_DATA", conflicts_with = "periodic")]
        data: Option<String>,

        /// Send "sender=<id>, no=<n>" on every sendable channel instead of reading stdin
        #[arg(long)]
        periodic: bool,

        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },

    /// Receive remote video and audio
    Recvonly {
        #[arg(long, default_value_t = 16_000)]
        sample_rate: u32,

        #[arg(long, default_value_t = 1)]
        channels: u16,

        /// Log every Nth displayed frame
        #[arg(long, default_value_t = 30)]
        log_every: u64,
    },

    /// Send a test pattern and a tone
    Sendonly {
        #[arg(long, env = "SORA_CAMERA_ID", default_value_t = 0)]
        camera_id: u32,

        #[arg(long, env = "SORA_VIDEO_WIDTH", default_value_t = 640)]
        video_width: u32,

        #[arg(long, env = "SORA_VIDEO_HEIGHT", default_value_t = 360)]
        video_height: u32,

        #[arg(long, env = "SORA_VIDEO_BIT_RATE", default_value_t = 500)]
        video_bit_rate: u32,

        #[arg(long, env = "SORA_VIDEO_CODEC_TYPE")]
        video_codec_type: Option<String>,

        #[arg(long, env = "SORA_AUDIO_CODEC_TYPE")]
        audio_codec_type: Option<String>,

        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,
    },
}

impl Cli {
    pub fn session_config(&self) -> Result<SessionConfig> {
        let conn = &self.connection;
        let mut config = match &self.command {
            Commands::Messaging {
                label,
                data_channels,
                ..
            } => {
                let specs = match data_channels {
                    Some(json) => DataChannelSpec::parse_list(json)?,
                    None => vec![DataChannelSpec::new(label.clone(), Direction::Sendrecv)],
                };
                SessionConfig::messaging(conn.signaling_urls.clone(), &conn.channel_id, specs)
            }

            Commands::Recvonly {
                sample_rate,
                channels,
                ..
            } => {
                let mut config =
                    SessionConfig::new(conn.signaling_urls.clone(), &conn.channel_id, Role::Recvonly);
                config.audio_format.sample_rate = *sample_rate;
                config.audio_format.channels = *channels;
                config
            }

            Commands::Sendonly {
                video_width,
                video_height,
                video_bit_rate,
                video_codec_type,
                audio_codec_type,
                ..
            } => {
                let mut config =
                    SessionConfig::new(conn.signaling_urls.clone(), &conn.channel_id, Role::Sendonly);
                config.video_settings = VideoSettings {
                    codec_type: video_codec_type.clone(),
                    bit_rate: *video_bit_rate,
                    width: Some(*video_width),
                    height: Some(*video_height),
                };
                config.audio_codec_type = audio_codec_type.clone();
                config
            }
        };

        if let Some(metadata) = &conn.metadata {
            let metadata = serde_json::from_str(metadata).context("SORA_METADATA is not valid JSON")?;
            config = config.with_metadata(metadata);
        }
        config = config.with_connection_timeout(Duration::from_millis(conn.connection_timeout_ms));
        config.validate()?;
        Ok(config)
    }

    pub fn loopback_options(&self) -> LoopbackOptions {
        let mut options = LoopbackOptions {
            disconnect_after: self.connection.disconnect_after_ms.map(Duration::from_millis),
            ..LoopbackOptions::default()
        };
        if let Commands::Sendonly {
            video_width,
            video_height,
            ..
        } = &self.command
        {
            options.frame_width = *video_width;
            options.frame_height = *video_height;
        }
        options
    }
}
