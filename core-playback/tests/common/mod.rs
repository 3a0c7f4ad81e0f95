//! Shared fixtures: a transport fed by the test and an output device the test
//! pulls by hand.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AudioOutputDevice, AudioSource, AudioTransport, BridgeError, ManualClock, OutputStream,
    PcmFormat, RenderCallback, TransportResponse, TransportSink, TransportStatus,
};
use core_playback::{EventLoop, StreamerConfig};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, PlaybackEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

pub const SAMPLE_RATE: u32 = 8_000;

/// One scripted transport callback.
pub enum Feed {
    Response(TransportResponse),
    Data(Vec<u8>),
    Complete,
    Fail(String),
}

/// Transport whose callbacks are pushed by the test.
pub struct ChannelTransport {
    feeds: Mutex<Option<UnboundedReceiver<Feed>>>,
}

impl ChannelTransport {
    pub fn new() -> (Arc<Self>, UnboundedSender<Feed>) {
        let (tx, rx) = unbounded_channel();
        (
            Arc::new(Self {
                feeds: Mutex::new(Some(rx)),
            }),
            tx,
        )
    }

    /// Transport that delivers `body` in `chunk`-sized pieces and completes.
    pub fn with_body(body: &[u8], chunk: usize) -> Arc<Self> {
        let (transport, tx) = Self::new();
        let _ = tx.send(Feed::Response(TransportResponse::ok(Some(body.len() as u64))));
        for piece in body.chunks(chunk) {
            let _ = tx.send(Feed::Data(piece.to_vec()));
        }
        let _ = tx.send(Feed::Complete);
        transport
    }
}

#[async_trait]
impl AudioTransport for ChannelTransport {
    fn supports(&self, _source: &AudioSource) -> bool {
        true
    }

    async fn fetch(
        &self,
        _source: &AudioSource,
        sink: Arc<dyn TransportSink>,
        cancel: CancellationToken,
    ) -> BridgeResult<()> {
        let mut feeds = self
            .feeds
            .lock()
            .take()
            .ok_or_else(|| BridgeError::OperationFailed("already fetched".to_string()))?;

        loop {
            let feed = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
                feed = feeds.recv() => feed,
            };
            match feed {
                Some(Feed::Response(response)) => sink.on_response(response),
                Some(Feed::Data(bytes)) => sink.on_data(&bytes),
                Some(Feed::Complete) => {
                    sink.on_complete();
                    return Ok(());
                }
                Some(Feed::Fail(reason)) => {
                    let error = BridgeError::Transport(reason.clone());
                    sink.on_failed(error);
                    return Err(BridgeError::Transport(reason));
                }
                // Sender dropped without completing: wait for cancellation.
                None => {
                    cancel.cancelled().await;
                    return Err(BridgeError::Cancelled);
                }
            }
        }
    }
}

/// Output device whose render callback the test invokes.
#[derive(Default)]
pub struct PulledDevice {
    callback: Mutex<Option<Arc<dyn RenderCallback>>>,
    running: Arc<AtomicBool>,
}

struct PulledStream {
    running: Arc<AtomicBool>,
}

impl OutputStream for PulledStream {
    fn start(&mut self) -> BridgeResult<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&mut self) -> BridgeResult<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl AudioOutputDevice for PulledDevice {
    fn name(&self) -> String {
        "pulled".to_string()
    }

    fn open(
        &self,
        _format: PcmFormat,
        callback: Arc<dyn RenderCallback>,
    ) -> BridgeResult<Box<dyn OutputStream>> {
        *self.callback.lock() = Some(callback);
        Ok(Box::new(PulledStream {
            running: self.running.clone(),
        }))
    }
}

impl PulledDevice {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Pull `seconds` of stereo output, as the hardware would.
    pub fn pull(&self, seconds: f64) -> Vec<f32> {
        let samples = (seconds * SAMPLE_RATE as f64) as usize * 2;
        let mut out = vec![0.0; samples];
        if self.is_running() {
            if let Some(callback) = self.callback.lock().as_ref() {
                callback.render(&mut out);
            }
        }
        out
    }
}

/// 16-bit stereo WAV at [`SAMPLE_RATE`], `seconds` long, filled with a ramp.
pub fn wav_bytes(seconds: f64) -> Vec<u8> {
    let frames = (seconds * SAMPLE_RATE as f64) as u32;
    let data_len = frames * 4;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 4).to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for frame in 0..frames {
        let sample = ((frame % 2000) as i16 - 1000) * 16;
        out.extend_from_slice(&sample.to_le_bytes());
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

pub fn streamer_config() -> StreamerConfig {
    StreamerConfig {
        preroll: 1.0,
        renderer_buffer: 1.0,
        queue_high_water: 2.0,
        decode_backoff: Duration::from_millis(2),
        position_interval: Duration::from_millis(20),
        event_buffer: 65_536,
        ..StreamerConfig::default()
    }
}

pub fn core_config(
    transport: Arc<dyn AudioTransport>,
    device: Arc<PulledDevice>,
) -> CoreConfig {
    CoreConfig::builder()
        .transport(transport)
        .output_device(device)
        .clock(Arc::new(ManualClock::default()))
        .build()
        .expect("core config")
}

pub fn event_loop(transport: Arc<dyn AudioTransport>, device: Arc<PulledDevice>) -> EventLoop {
    EventLoop::new(core_config(transport, device), streamer_config()).expect("event loop")
}

pub fn source() -> AudioSource {
    AudioSource::remote("https://media.example.com/tone.wav")
}

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

pub async fn wait_for_status(player: &EventLoop, status: TransportStatus) {
    wait_until(&format!("{status}"), || player.status() == status).await;
}

/// Pull output until the session finishes.
pub async fn play_to_end(player: &EventLoop, device: &PulledDevice) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while player.status() != TransportStatus::Finished {
        assert!(
            tokio::time::Instant::now() < deadline,
            "playback never finished, status {}",
            player.status()
        );
        device.pull(0.05);
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

pub fn drain_playback_events(rx: &mut Receiver<CoreEvent>) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(CoreEvent::Playback(event)) => events.push(event),
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}

pub fn status_changes(events: &[PlaybackEvent]) -> Vec<(TransportStatus, TransportStatus)> {
    events
        .iter()
        .filter_map(|event| match event {
            PlaybackEvent::StatusChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}
