mod args;
mod devices;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use colored::*;
use dialoguer::Input;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tether_session::{
    LoopbackConnector, MediaFrameQueue, Orchestrator, Popped, RunOutcome, Session, Shutdown,
    StopReason,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::args::{Cli, Commands};
use crate::devices::{ClockedAudioOutput, LogDisplay, TestPatternCapture, ToneAudioInput};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.session_config().context("Invalid configuration")?;
    let connector = LoopbackConnector::new(cli.loopback_options());
    let session = Arc::new(Session::new(config, &connector).context("Failed to create session")?);
    let shutdown = Shutdown::new();

    tokio::spawn(interrupt_on_ctrl_c(shutdown.clone()));

    println!(
        "{} {}",
        "Connecting to".cyan(),
        session.config().channel_id.bold()
    );

    let orchestrator = Orchestrator::new(session.clone(), shutdown);
    let outcome = match cli.command {
        Commands::Messaging {
            label,
            data,
            periodic,
            interval_ms,
            ..
        } => {
            let printer = spawn_message_printer(&session);
            let outcome = if periodic {
                let sender_id = (Uuid::new_v4().as_u128() % 9_999) as u32 + 1;
                println!("{} {}", "Sender id".cyan(), sender_id);
                tokio::task::spawn_blocking(move || {
                    orchestrator.run_messaging_periodic(sender_id, Duration::from_millis(interval_ms))
                })
                .await?
            } else {
                let outbox = Arc::new(MediaFrameQueue::new());
                match data {
                    Some(data) => {
                        outbox.push(Bytes::from(data));
                        outbox.close();
                    }
                    None => spawn_stdin_reader(outbox.clone(), label.clone()),
                }
                tokio::task::spawn_blocking(move || orchestrator.run_messaging(&label, &outbox))
                    .await?
            };
            join_printer(printer).await?;
            outcome
        }

        Commands::Recvonly { log_every, .. } => {
            tokio::task::spawn_blocking(move || {
                orchestrator.run_recvonly(&mut LogDisplay::new(log_every), &mut ClockedAudioOutput)
            })
            .await?
        }

        Commands::Sendonly {
            camera_id,
            video_width,
            video_height,
            fps,
            frames,
            ..
        } => {
            info!("Using test pattern in place of camera {}", camera_id);
            tokio::task::spawn_blocking(move || {
                let mut capture = TestPatternCapture::new(video_width, video_height, fps, frames);
                orchestrator.run_sendonly(&mut capture, &mut ToneAudioInput { hz: 440.0 })
            })
            .await?
        }
    };

    if cli.connection.stats {
        match session.stats() {
            Ok(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
            Err(e) => warn!("Stats unavailable: {}", e),
        }
    }

    let outcome = outcome.context("Session failed")?;
    print_outcome(&outcome);
    Ok(())
}

/// First Ctrl-C triggers shutdown, which interrupts a pending connect or
/// send; the run loop then disconnects.
async fn interrupt_on_ctrl_c(shutdown: Shutdown) {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Ctrl-C handler unavailable");
        return;
    }
    println!("{}", "Interrupted, disconnecting...".yellow());
    shutdown.trigger();
}

/// Prints received messages until the session closes.
fn spawn_message_printer(session: &Session) -> thread::JoinHandle<()> {
    let messages = session.messages();
    thread::spawn(move || {
        loop {
            match messages.pop(Duration::from_secs(1)) {
                Popped::Frame(frame) => {
                    let message = frame.into_payload();
                    println!(
                        "{} {} {}",
                        "<".green(),
                        message.label.bold(),
                        message.text_lossy()
                    );
                }
                Popped::Empty => {}
                Popped::Closed => break,
            }
        }
    })
}

/// Joins the printer off the async runtime. A panicked printer is logged,
/// not propagated.
async fn join_printer(printer: thread::JoinHandle<()>) -> Result<()> {
    if tokio::task::spawn_blocking(move || printer.join()).await?.is_err() {
        warn!("Message printer panicked");
    }
    Ok(())
}

/// Reads lines from the terminal into the outbox; an empty line or EOF ends input.
fn spawn_stdin_reader(outbox: Arc<MediaFrameQueue<Bytes>>, label: String) {
    thread::spawn(move || {
        let prompt = format!("{} >", label);
        loop {
            let line: String = match Input::new()
                .with_prompt(&prompt)
                .allow_empty(true)
                .interact_text()
            {
                Ok(line) => line,
                Err(e) => {
                    warn!("Input closed: {}", e);
                    break;
                }
            };
            if line.is_empty() || !outbox.push(Bytes::from(line)) {
                break;
            }
        }
        outbox.close();
    });
}

fn print_outcome(outcome: &RunOutcome) {
    let reason = match &outcome.stop {
        StopReason::Interrupted => "interrupted".yellow(),
        StopReason::Quit => "quit".normal(),
        StopReason::Completed => "completed".green(),
        StopReason::CaptureEnded => "capture ended".normal(),
        StopReason::Closed => "closed".normal(),
        StopReason::TransportDisconnect {
            error_code,
            message,
        } => format!("disconnected: error_code='{}' message='{}'", error_code, message).red(),
    };

    println!("{} {}", "Session finished:".bold(), reason);
    if outcome.frames > 0 {
        println!("   frames:   {}", outcome.frames);
    }
    if outcome.messages_sent > 0 {
        println!("   messages: {}", outcome.messages_sent);
    }
}
