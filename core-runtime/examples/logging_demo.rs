//! Logging and event bus demonstration
//!
//! Emits a scripted sequence of playback events and mirrors each one into
//! `tracing` at the severity the bus assigns it.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # With custom filter
//! cargo run --example logging_demo -- compact "logging_demo=trace"
//! ```

use bridge_traits::time::{ConsoleLogger, LogLevel};
use bridge_traits::TransportStatus;
use core_runtime::events::{
    AcquisitionEvent, CoreEvent, EventBus, EventSeverity, EventStream, PlaybackEvent,
};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use std::env;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug)
        .with_logger_sink(Arc::new(ConsoleLogger {
            min_level: LogLevel::Warn,
        }));

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config).expect("Failed to initialize logging");

    info!(format = ?format, "Logging initialized");

    let bus = EventBus::default();
    let stream = EventStream::new(bus.subscribe());
    let printer = tokio::spawn(mirror_events(stream));

    emit_session(&bus).await;
    drop(bus);

    printer.await.ok();
    info!("Demo complete");
}

#[instrument(skip(bus))]
async fn emit_session(bus: &EventBus) {
    let url = "https://cdn.example.com/clip.wav?sig=secret";
    info!(
        url = %redact_if_sensitive("url", url),
        cache = %strip_path("/home/user/.cache/streamer/clip.wav"),
        "Opening source"
    );

    bus.emit_playback(PlaybackEvent::StatusChanged {
        from: TransportStatus::Idle,
        to: TransportStatus::Buffering,
    });
    bus.emit_acquisition(AcquisitionEvent::ResponseReceived {
        status_code: 200,
        content_length: Some(1_764_044),
    });

    for step in 1..=4 {
        bus.emit_playback(PlaybackEvent::BufferingProgress {
            ratio: step as f64 / 4.0,
        });
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    bus.emit_playback(PlaybackEvent::StatusChanged {
        from: TransportStatus::Buffering,
        to: TransportStatus::Playing,
    });
    bus.emit_playback(PlaybackEvent::Interrupted { interrupted: true });
    bus.emit_playback(PlaybackEvent::Error {
        message: "decoder reported a corrupt frame".to_string(),
        recoverable: false,
    });
}

async fn mirror_events(mut stream: EventStream) {
    while let Ok(event) = stream.recv().await {
        match event.severity() {
            EventSeverity::Debug => debug!(event = ?event, "{}", event.description()),
            EventSeverity::Info => info!(event = ?event, "{}", event.description()),
            EventSeverity::Warning => warn!(event = ?event, "{}", event.description()),
            EventSeverity::Error => error!(event = ?event, "{}", event.description()),
        }

        if matches!(event, CoreEvent::Playback(PlaybackEvent::Error { .. })) {
            break;
        }
    }
}
