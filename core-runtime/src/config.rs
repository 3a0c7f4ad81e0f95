//! # Core Configuration Module
//!
//! Assembles the host bridges a streaming session needs.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds every collaborator the playback core depends on. It
//! enforces fail-fast validation so a missing capability is reported when the
//! engine is constructed rather than when the first source is played.
//!
//! ## Required Dependencies
//!
//! - `AudioTransport` - At least one, to fetch source bytes
//! - `AudioOutputDevice` - Hardware output path for the renderer
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `CodecFactory` - Extra codecs on top of the built-in WAV/LPCM codec
//! - `Clock` - Time source for transfer-rate windows (default: `SystemClock`)
//! - `CacheStore` - Persists downloaded bytes (default: none)
//! - `LoggerSink` - Host logging pipeline (default: none)
//!
//! When the `desktop-shims` feature is enabled, `FileTransport` and
//! `HttpTransport` are injected automatically if no transport is provided.
//! With `cpal-output`, the default `cpal` output device is injected as well.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .transport(Arc::new(MyLibraryExporter))
//!     .output_device(Arc::new(MyAudioUnit))
//!     .build()?;
//! # Ok::<(), core_runtime::Error>(())
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    AudioOutputDevice, AudioSource, AudioTransport, CacheStore, Clock, CodecFactory, LoggerSink,
    SystemClock,
};
use std::sync::Arc;

/// Collaborators for the streaming engine.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Transports consulted in order; the first that supports a source wins.
    pub transports: Vec<Arc<dyn AudioTransport>>,

    /// Hardware output device (required)
    pub output_device: Arc<dyn AudioOutputDevice>,

    /// Additional codecs, consulted before the built-in ones
    pub codec_factories: Vec<Arc<dyn CodecFactory>>,

    /// Time source for download speed estimation
    pub clock: Arc<dyn Clock>,

    /// Optional persistence of acquired bytes
    pub cache_store: Option<Arc<dyn CacheStore>>,

    /// Optional host logging sink
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("transports", &self.transports.len())
            .field("output_device", &self.output_device.name())
            .field("codec_factories", &self.codec_factories.len())
            .field("cache_store", &self.cache_store.as_ref().map(|_| "CacheStore { ... }"))
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.transports.is_empty() {
            return Err(transport_missing_error());
        }

        Ok(())
    }

    /// Selects the first transport able to fetch `source`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when no configured transport
    /// supports the source.
    pub fn transport_for(&self, source: &AudioSource) -> Result<Arc<dyn AudioTransport>> {
        self.transports
            .iter()
            .find(|transport| transport.supports(source))
            .cloned()
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "AudioTransport".to_string(),
                message: format!(
                    "No configured transport supports {} sources. \
                     Inject an AudioTransport that handles this source kind.",
                    if source.is_remote() { "remote" } else { "local" }
                ),
            })
    }
}

fn transport_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioTransport".to_string(),
        message: "At least one AudioTransport implementation is required to acquire bytes. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use FileTransport and HttpTransport. \
                 Mobile: inject platform transports (URLSession, media library exporter)."
            .to_string(),
    }
}

#[cfg(not(feature = "cpal-output"))]
fn output_device_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioOutputDevice".to_string(),
        message: "An AudioOutputDevice implementation is required for rendering. \
                 Desktop: enable the 'cpal-output' feature to use the default cpal device. \
                 Mobile: inject the platform output unit (AudioQueue/AAudio)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_transports() -> Result<Vec<Arc<dyn AudioTransport>>> {
    use bridge_desktop::{FileTransport, HttpTransport};

    let http = HttpTransport::new()
        .map_err(|e| Error::Internal(format!("Failed to create default HttpTransport: {}", e)))?;

    let transports: Vec<Arc<dyn AudioTransport>> =
        vec![Arc::new(FileTransport::new()), Arc::new(http)];
    Ok(transports)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_transports() -> Result<Vec<Arc<dyn AudioTransport>>> {
    Err(transport_missing_error())
}

#[cfg(feature = "cpal-output")]
fn provide_default_output_device() -> Result<Arc<dyn AudioOutputDevice>> {
    use bridge_desktop::CpalOutputDevice;

    let device: Arc<dyn AudioOutputDevice> = Arc::new(CpalOutputDevice::default_device());
    Ok(device)
}

#[cfg(not(feature = "cpal-output"))]
fn provide_default_output_device() -> Result<Arc<dyn AudioOutputDevice>> {
    Err(output_device_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    transports: Vec<Arc<dyn AudioTransport>>,
    output_device: Option<Arc<dyn AudioOutputDevice>>,
    codec_factories: Vec<Arc<dyn CodecFactory>>,
    clock: Option<Arc<dyn Clock>>,
    cache_store: Option<Arc<dyn CacheStore>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl CoreConfigBuilder {
    /// Adds a transport. May be called repeatedly; order is preserved.
    pub fn transport(mut self, transport: Arc<dyn AudioTransport>) -> Self {
        self.transports.push(transport);
        self
    }

    /// Sets the output device implementation (required).
    pub fn output_device(mut self, device: Arc<dyn AudioOutputDevice>) -> Self {
        self.output_device = Some(device);
        self
    }

    /// Registers an additional codec.
    pub fn codec_factory(mut self, factory: Arc<dyn CodecFactory>) -> Self {
        self.codec_factories.push(factory);
        self
    }

    /// Sets the time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Enables persistence of acquired bytes.
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    /// Sets the host logging sink.
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] if no transport or output device
    /// was provided and no platform default is available.
    pub fn build(self) -> Result<CoreConfig> {
        let transports = if self.transports.is_empty() {
            provide_default_transports()?
        } else {
            self.transports
        };

        let output_device = match self.output_device {
            Some(device) => device,
            None => provide_default_output_device()?,
        };

        let config = CoreConfig {
            transports,
            output_device,
            codec_factories: self.codec_factories,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            cache_store: self.cache_store,
            logger_sink: self.logger_sink,
        };

        config.validate()?;

        Ok(config)
    }
}
