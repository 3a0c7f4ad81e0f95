//! Play a local file or HTTP(S) URL through the default output device.
//!
//! ```text
//! stream-play <path-or-url> [--cache <dir>] [--seek <seconds>]
//! ```

use anyhow::{bail, Context};
use bridge_desktop::{CacheDirectory, CpalOutputDevice, FileTransport, HttpTransport};
use bridge_traits::{AudioSource, TransportStatus};
use clap::Parser;
use core_playback::{EventLoop, StreamerConfig};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventSeverity, EventStream, PlaybackEvent};
use core_runtime::logging::{init_logging, LoggingConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "stream-play")]
#[command(about = "Stream an audio file or URL to the default output device")]
#[command(version)]
struct Args {
    /// Local path or http(s) URL to play
    target: String,

    /// Directory that keeps a copy of every stream played
    #[arg(long, env = "STREAM_PLAY_CACHE")]
    cache: Option<PathBuf>,

    /// Position in seconds to jump to once playback starts
    #[arg(long)]
    seek: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(LoggingConfig::default()).context("failed to initialise logging")?;

    let source = if args.target.contains("://") {
        AudioSource::remote(&args.target)
    } else {
        AudioSource::local(&args.target)
    };

    let mut builder = CoreConfig::builder()
        .transport(Arc::new(FileTransport::new()))
        .transport(Arc::new(HttpTransport::new()?))
        .output_device(Arc::new(CpalOutputDevice::default_device()));
    if let Some(dir) = args.cache {
        builder = builder.cache_store(Arc::new(CacheDirectory::with_root(dir)));
    }

    let player = EventLoop::new(builder.build()?, StreamerConfig::default())?;
    let mut events = EventStream::new(player.subscribe())
        .filter(|event| matches!(event, CoreEvent::Playback(_)));
    player.play(Some(source))?;

    let mut pending_seek = args.seek;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        };
        log_event(&event);
        let CoreEvent::Playback(event) = event else {
            continue;
        };

        match event {
            PlaybackEvent::StatusChanged { to, .. } => {
                if to == TransportStatus::Playing {
                    if let Some(target) = pending_seek.take() {
                        player.seek_to_time(target)?;
                    }
                }
                if to == TransportStatus::Finished {
                    info!("Playback finished");
                    break;
                }
            }
            PlaybackEvent::PositionChanged {
                position_ms,
                duration_ms,
            } => {
                eprint!("\r{:>6.1}s / {:.1}s", position_ms as f64 / 1000.0, duration_ms as f64 / 1000.0);
            }
            PlaybackEvent::Error { message, .. } => bail!("playback failed: {message}"),
            _ => {}
        }
    }

    eprintln!();
    player.stop();
    Ok(())
}

/// Mirror an event into the log at the severity the bus assigns it.
fn log_event(event: &CoreEvent) {
    match event.severity() {
        EventSeverity::Debug => debug!(event = ?event, "{}", event.description()),
        EventSeverity::Info => info!(event = ?event, "{}", event.description()),
        EventSeverity::Warning => warn!(event = ?event, "{}", event.description()),
        EventSeverity::Error => error!(event = ?event, "{}", event.description()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_cache_and_seek() {
        let args = Args::try_parse_from([
            "stream-play",
            "https://media.example.com/tone.mp3",
            "--cache",
            "/tmp/stream-cache",
            "--seek",
            "12.5",
        ])
        .unwrap();
        assert_eq!(args.target, "https://media.example.com/tone.mp3");
        assert_eq!(args.cache, Some(PathBuf::from("/tmp/stream-cache")));
        assert_eq!(args.seek, Some(12.5));
    }

    #[test]
    fn target_is_required() {
        assert!(Args::try_parse_from(["stream-play"]).is_err());
    }
}
