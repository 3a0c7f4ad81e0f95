//! Hardware output contracts.
//!
//! The renderer owns a [`RenderCallback`]; the host device invokes it from its
//! real-time audio thread to obtain interleaved `f32` samples. The callback
//! never blocks for long, never allocates, and writes silence when starved.

use crate::error::Result;
use crate::platform::{PlatformSend, PlatformSendSync};
use crate::playback::PcmFormat;
use std::sync::Arc;

/// Pull-side of the renderer, invoked on the real-time audio thread.
pub trait RenderCallback: Send + Sync {
    /// Fill `out` with interleaved samples in the opened format, normalised to
    /// `[-1.0, 1.0]`. Every element of `out` must be written.
    fn render(&self, out: &mut [f32]);
}

/// Host audio device capable of opening an output stream.
pub trait AudioOutputDevice: PlatformSendSync {
    /// Human-readable device name for diagnostics.
    fn name(&self) -> String;

    /// Allocate an output path for `format`, driven by `callback`.
    ///
    /// The returned stream starts paused.
    fn open(&self, format: PcmFormat, callback: Arc<dyn RenderCallback>)
        -> Result<Box<dyn OutputStream>>;
}

/// Live hardware output path. Dropping it tears the path down.
pub trait OutputStream: PlatformSend {
    /// Start (or resume) invoking the render callback.
    fn start(&mut self) -> Result<()>;

    /// Stop invoking the render callback without releasing the path.
    fn pause(&mut self) -> Result<()>;
}
