//! # Streaming Playback Example
//!
//! Plays a synthetic WAV file through the full pipeline: a throttled
//! in-memory transport stands in for the network and a console device pulls
//! PCM in real time, printing levels instead of producing sound.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AudioOutputDevice, AudioSource, AudioTransport, BridgeError, OutputStream, PcmFormat,
    RenderCallback, TransportResponse, TransportSink, TransportStatus,
};
use core_playback::{EventLoop, Result, StreamerConfig};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, PlaybackEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SAMPLE_RATE: u32 = 22_050;

// ============================================================================
// Throttled In-Memory Transport
// ============================================================================

struct ThrottledTransport {
    body: Vec<u8>,
    bytes_per_tick: usize,
    tick: Duration,
}

#[async_trait]
impl AudioTransport for ThrottledTransport {
    fn supports(&self, _source: &AudioSource) -> bool {
        true
    }

    async fn fetch(
        &self,
        _source: &AudioSource,
        sink: Arc<dyn TransportSink>,
        cancel: CancellationToken,
    ) -> BridgeResult<()> {
        sink.on_response(
            TransportResponse::ok(Some(self.body.len() as u64)).with_mime_type("audio/wav"),
        );
        for piece in self.body.chunks(self.bytes_per_tick) {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
                _ = tokio::time::sleep(self.tick) => sink.on_data(piece),
            }
        }
        sink.on_complete();
        Ok(())
    }
}

// ============================================================================
// Console Output Device
// ============================================================================

struct ConsoleDevice;

struct ConsoleStream {
    running: Arc<AtomicBool>,
}

impl OutputStream for ConsoleStream {
    fn start(&mut self) -> BridgeResult<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&mut self) -> BridgeResult<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for ConsoleStream {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl AudioOutputDevice for ConsoleDevice {
    fn name(&self) -> String {
        "console".to_string()
    }

    fn open(
        &self,
        format: PcmFormat,
        callback: Arc<dyn RenderCallback>,
    ) -> BridgeResult<Box<dyn OutputStream>> {
        let running = Arc::new(AtomicBool::new(false));
        let pulled = running.clone();
        let period = Duration::from_millis(100);
        let samples = (format.sample_rate as usize / 10) * format.channels as usize;

        // Hardware thread stand-in: pull 100 ms of audio every 100 ms.
        std::thread::spawn(move || {
            let mut out = vec![0.0f32; samples];
            while Arc::strong_count(&pulled) > 1 {
                std::thread::sleep(period);
                if pulled.load(Ordering::SeqCst) {
                    callback.render(&mut out);
                    let peak = out.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
                    println!("   🔈 {:<40}", "#".repeat((peak * 40.0) as usize));
                }
            }
        });

        Ok(Box::new(ConsoleStream { running }))
    }
}

fn sine_wav(seconds: f64, frequency: f64) -> Vec<u8> {
    let frames = (seconds * SAMPLE_RATE as f64) as u32;
    let data_len = frames * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for i in 0..frames {
        let t = i as f64 / SAMPLE_RATE as f64;
        // Fade in so the level meter has something to show.
        let envelope = (t / seconds).min(1.0);
        let sample = (2.0 * std::f64::consts::PI * frequency * t).sin() * envelope * 0.8;
        out.extend_from_slice(&((sample * i16::MAX as f64) as i16).to_le_bytes());
    }
    out
}

// ============================================================================
// Main Demo
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("core_playback=info")
        .init();

    println!("🎵 Streaming Playback Demo\n");

    let body = sine_wav(3.0, 440.0);
    // Deliver roughly twice as fast as real time.
    let transport = Arc::new(ThrottledTransport {
        body,
        bytes_per_tick: SAMPLE_RATE as usize / 5,
        tick: Duration::from_millis(50),
    });

    let core = CoreConfig::builder()
        .transport(transport)
        .output_device(Arc::new(ConsoleDevice))
        .build()?;
    let player = EventLoop::new(core, StreamerConfig::low_latency())?;
    let mut events = player.subscribe();

    player.play(Some(AudioSource::remote("https://example.invalid/a4.wav")))?;

    while let Ok(event) = events.recv().await {
        match event {
            CoreEvent::Playback(PlaybackEvent::StatusChanged { from, to }) => {
                println!("📍 {from} -> {to}");
                if matches!(to, TransportStatus::Finished | TransportStatus::Error) {
                    break;
                }
            }
            CoreEvent::Playback(PlaybackEvent::DurationChanged {
                duration_ms,
                is_final,
            }) => println!("⏱️  Duration {duration_ms} ms (final: {is_final})"),
            CoreEvent::Playback(PlaybackEvent::Error { message, .. }) => {
                println!("❌ {message}")
            }
            _ => {}
        }
    }

    if let Some(snapshot) = player.snapshot() {
        println!("\n📊 Final state");
        println!("   Status: {}", snapshot.status);
        println!("   Played: {:.2}s of {:.2}s", snapshot.current_time, snapshot.duration);
        println!(
            "   Received: {} / {} bytes",
            snapshot.received_length, snapshot.expected_length
        );
    }

    player.stop();
    println!("\n🎉 Demo completed successfully!");
    Ok(())
}
