//! # Renderer
//!
//! Owns the hardware output path for one session.
//!
//! The feed path pushes canonical PCM into a bounded [`RingBuffer`] through
//! [`Renderer::render_bytes`]. The device pulls from the same buffer on its
//! real-time thread through the [`RenderCallback`] installed by
//! [`Renderer::prepare`]; that callback only takes the ring buffer's brief
//! lock, applies the volume gain, and writes silence when starved.
//!
//! Elapsed time is `time_base + frames_played / sample_rate`, where
//! `time_base` is moved by seeks and reset by a full stop.

use crate::decoder::SampleConverter;
use crate::error::{PlaybackError, Result};
use crate::ring_buffer::RingBuffer;
use bridge_traits::{AudioOutputDevice, OutputStream, PcmFormat, RenderCallback};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Samples converted per pass of the render callback.
const RENDER_BLOCK: usize = 512;

/// Hardware-facing state of the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Stopped,
    Started,
}

/// State shared with the real-time callback.
struct RenderShared {
    buffer: RingBuffer,
    channels: usize,
    gain: AtomicU32,
    running: AtomicBool,
    frames_played: AtomicU64,
    underruns: AtomicU64,
}

impl RenderShared {
    fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Relaxed))
    }
}

impl RenderCallback for RenderShared {
    fn render(&self, out: &mut [f32]) {
        if !self.running.load(Ordering::Acquire) {
            out.fill(0.0);
            return;
        }

        let gain = self.gain();
        let mut block = [0i16; RENDER_BLOCK];
        let mut written = 0;
        for dst in out.chunks_mut(RENDER_BLOCK) {
            let read = self.buffer.read(&mut block[..dst.len()]);
            SampleConverter::apply_gain(&block[..read], &mut dst[..read], gain);
            written += read;
            if read < dst.len() {
                dst[read..].fill(0.0);
                break;
            }
        }

        if written < out.len() {
            out[written..].fill(0.0);
            self.underruns.fetch_add(1, Ordering::Relaxed);
        }
        self.frames_played
            .fetch_add((written / self.channels) as u64, Ordering::Relaxed);
    }
}

/// Real-time PCM sink for one session.
pub struct Renderer {
    device: Arc<dyn AudioOutputDevice>,
    buffer_seconds: f64,
    volume: f32,
    state: RendererState,
    interrupted: bool,
    format: Option<PcmFormat>,
    shared: Option<Arc<RenderShared>>,
    stream: Option<Box<dyn OutputStream>>,
    time_base: f64,
    scratch: Vec<i16>,
}

impl Renderer {
    /// Create a renderer that will buffer `buffer_seconds` of PCM.
    pub fn new(device: Arc<dyn AudioOutputDevice>, buffer_seconds: f64) -> Self {
        Self {
            device,
            buffer_seconds,
            volume: 1.0,
            state: RendererState::Stopped,
            interrupted: false,
            format: None,
            shared: None,
            stream: None,
            time_base: 0.0,
            scratch: Vec::new(),
        }
    }

    /// Open the hardware path for `format`. The path starts paused.
    pub fn prepare(&mut self, format: PcmFormat) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        if !format.is_standard() {
            return Err(PlaybackError::AudioDeviceError(format!(
                "renderer expects canonical PCM, got {format:?}"
            )));
        }

        let capacity = format.seconds_to_bytes(self.buffer_seconds) / 2;
        let shared = Arc::new(RenderShared {
            buffer: RingBuffer::new(capacity),
            channels: format.channels as usize,
            gain: AtomicU32::new(self.volume.to_bits()),
            running: AtomicBool::new(false),
            frames_played: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
        });

        let stream = self
            .device
            .open(format, shared.clone() as Arc<dyn RenderCallback>)?;

        info!(
            device = %self.device.name(),
            sample_rate = format.sample_rate,
            capacity_samples = capacity,
            "Output prepared"
        );
        self.format = Some(format);
        self.shared = Some(shared);
        self.stream = Some(stream);
        self.state = RendererState::Stopped;
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.stream.is_some()
    }

    /// Push canonical PCM into the internal buffer.
    ///
    /// Returns the number of bytes accepted, which is short when the buffer
    /// is full. Callers should check [`Renderer::free_bytes`] first.
    pub fn render_bytes(&mut self, bytes: &[u8]) -> usize {
        let Some(shared) = &self.shared else {
            return 0;
        };

        self.scratch.clear();
        SampleConverter::bytes_to_samples(bytes, &mut self.scratch);
        let accepted = shared.buffer.write(&self.scratch);
        if accepted < self.scratch.len() {
            debug!(
                accepted,
                offered = self.scratch.len(),
                "Renderer buffer full"
            );
        }
        accepted * 2
    }

    /// Bytes that fit in the internal buffer right now.
    pub fn free_bytes(&self) -> usize {
        self.shared
            .as_ref()
            .map_or(0, |shared| shared.buffer.free_space() * 2)
    }

    /// Bytes buffered but not yet played.
    pub fn buffered_bytes(&self) -> usize {
        self.shared
            .as_ref()
            .map_or(0, |shared| shared.buffer.available() * 2)
    }

    /// Start (or resume) pulling from the buffer.
    ///
    /// While interrupted the state becomes `Started` but the hardware stays
    /// paused until the interruption clears.
    pub fn start(&mut self) -> Result<()> {
        let (Some(stream), Some(shared)) = (self.stream.as_mut(), self.shared.as_ref()) else {
            return Err(PlaybackError::AudioDeviceError(
                "output not prepared".to_string(),
            ));
        };

        self.state = RendererState::Started;
        if self.interrupted {
            debug!("Start deferred while output is interrupted");
            return Ok(());
        }

        stream.start()?;
        shared.running.store(true, Ordering::Release);
        Ok(())
    }

    /// Stop pulling without discarding buffered audio.
    pub fn pause(&mut self) {
        if let Some(shared) = &self.shared {
            shared.running.store(false, Ordering::Release);
        }
        if let Some(stream) = self.stream.as_mut() {
            if let Err(err) = stream.pause() {
                warn!(error = %err, "Failed to pause output stream");
            }
        }
        self.state = RendererState::Stopped;
    }

    /// Drop buffered-but-unplayed audio.
    ///
    /// With `reset_timing` the elapsed time returns to zero; otherwise the
    /// position reached so far is kept as the new time base.
    pub fn flush(&mut self, reset_timing: bool) {
        let elapsed = self.elapsed();
        if let Some(shared) = &self.shared {
            shared.buffer.clear();
            shared.frames_played.store(0, Ordering::Relaxed);
        }
        self.time_base = if reset_timing { 0.0 } else { elapsed };
    }

    /// Restart elapsed time from `seconds`.
    pub fn set_time_base(&mut self, seconds: f64) {
        if let Some(shared) = &self.shared {
            shared.frames_played.store(0, Ordering::Relaxed);
        }
        self.time_base = seconds.max(0.0);
    }

    /// Seconds of audio played, including the time base.
    pub fn elapsed(&self) -> f64 {
        match (&self.shared, &self.format) {
            (Some(shared), Some(format)) => {
                self.time_base
                    + format.frames_to_seconds(shared.frames_played.load(Ordering::Relaxed))
            }
            _ => self.time_base,
        }
    }

    /// Set the output gain, clamped to `[0, 1]`. Returns the stored value.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.volume = volume;
        if let Some(shared) = &self.shared {
            shared.gain.store(volume.to_bits(), Ordering::Relaxed);
        }
        volume
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Record a platform interruption.
    ///
    /// Beginning an interruption silences the hardware and keeps buffered
    /// audio. Ending it does not resume output; [`Renderer::start`] must be
    /// called again.
    pub fn set_interrupted(&mut self, interrupted: bool) {
        if self.interrupted == interrupted {
            return;
        }
        self.interrupted = interrupted;
        if interrupted {
            self.pause();
        }
        info!(interrupted, "Output interruption changed");
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Tear down the hardware path and reset timing.
    pub fn stop(&mut self) {
        self.pause();
        self.flush(true);
        self.stream = None;
        self.shared = None;
        self.format = None;
        debug!("Output torn down");
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Callbacks that found the buffer starved while running.
    pub fn underruns(&self) -> u64 {
        self.shared
            .as_ref()
            .map_or(0, |shared| shared.underruns.load(Ordering::Relaxed))
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("state", &self.state)
            .field("interrupted", &self.interrupted)
            .field("volume", &self.volume)
            .field("buffered_bytes", &self.buffered_bytes())
            .finish()
    }
}
