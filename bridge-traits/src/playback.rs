//! Source and PCM format types shared by every playback collaborator.
//!
//! Transports use [`AudioSource`] to locate bytes, codecs describe their output
//! with [`PcmFormat`], and output devices open a hardware path for the same
//! [`PcmFormat`]. Keeping these in the bridge crate lets host adapters depend on
//! them without pulling in the playback core.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supported audio codec identifiers.
///
/// This enum is intentionally extensible; use [`AudioCodec::Other`] for codecs
/// not explicitly listed here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Mp3,
    Aac,
    Flac,
    Vorbis,
    Opus,
    Wav,
    Alac,
    /// Codec is unknown or not yet mapped to a dedicated variant.
    Unknown,
    /// Vendor- or platform-specific codec.
    Other(String),
}

impl AudioCodec {
    /// Returns `true` if this is a lossless codec.
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioCodec::Flac | AudioCodec::Wav | AudioCodec::Alac)
    }
}

/// Location of the bytes for one playback session.
///
/// A source exposes exactly one required attribute, an addressable URL.
/// Local files are addressed with a `file://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// File readable by the host runtime (bundle, sandbox, exported library item).
    LocalFile { path: PathBuf },
    /// Remote HTTP(S) resource fetched incrementally.
    RemoteUrl {
        url: String,
        headers: HashMap<String, String>,
    },
}

impl AudioSource {
    /// Source backed by a local file.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        AudioSource::LocalFile { path: path.into() }
    }

    /// Source backed by a remote URL with no extra request headers.
    pub fn remote(url: impl Into<String>) -> Self {
        AudioSource::RemoteUrl {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Attach a request header. Has no effect on local sources.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let AudioSource::RemoteUrl { headers, .. } = &mut self {
            headers.insert(key.into(), value.into());
        }
        self
    }

    /// The addressable URL of this source.
    pub fn url(&self) -> String {
        match self {
            AudioSource::LocalFile { path } => format!("file://{}", path.display()),
            AudioSource::RemoteUrl { url, .. } => url.clone(),
        }
    }

    /// Determine whether the source represents remote content.
    pub fn is_remote(&self) -> bool {
        matches!(self, AudioSource::RemoteUrl { .. })
    }

    /// Lower-cased file extension of the addressed resource, if any.
    ///
    /// Query strings and fragments are ignored for remote URLs.
    pub fn file_extension(&self) -> Option<String> {
        let name = match self {
            AudioSource::LocalFile { path } => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)?,
            AudioSource::RemoteUrl { url, .. } => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                let after_scheme = without_query
                    .split_once("://")
                    .map(|(_, rest)| rest)
                    .unwrap_or(without_query);
                // Host-only URLs have no path segment and therefore no extension.
                let (_, path) = after_scheme.split_once('/')?;
                path.rsplit('/').next()?.to_string()
            }
        };

        Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// Transport status of a playback session.
///
/// `Error` is terminal: the only way out is `stop()`, which returns the
/// session to `Idle`. `Finished` also leaves through a seek, back into
/// `Buffering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportStatus {
    Idle,
    Buffering,
    Playing,
    Paused,
    Finished,
    Error,
}

impl TransportStatus {
    /// Returns `true` if the machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: TransportStatus) -> bool {
        use TransportStatus::*;

        match (self, next) {
            (from, to) if from == to => false,
            (_, Idle) => true,
            (Idle, Buffering) => true,
            (Buffering, Playing) | (Buffering, Paused) => true,
            (Playing, Buffering) | (Playing, Paused) => true,
            (Paused, Buffering) | (Finished, Buffering) => true,
            (Idle, _) | (Finished, _) | (Error, _) => false,
            (_, Finished) | (_, Error) => true,
            _ => false,
        }
    }

    /// Returns `true` for `Finished` and `Error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransportStatus::Finished | TransportStatus::Error)
    }

    /// Returns `true` while the session holds an output path and a source.
    pub fn is_active(self) -> bool {
        !matches!(self, TransportStatus::Idle)
    }
}

impl std::fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransportStatus::Idle => "idle",
            TransportStatus::Buffering => "buffering",
            TransportStatus::Playing => "playing",
            TransportStatus::Paused => "paused",
            TransportStatus::Finished => "finished",
            TransportStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Linear PCM layout.
///
/// The decoder always hands the renderer data in the canonical layout returned
/// by [`PcmFormat::standard`]: signed 16-bit little-endian samples, two
/// interleaved channels, at the source sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PcmFormat {
    /// Sample rate in hertz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
}

impl PcmFormat {
    pub const STANDARD_CHANNELS: u16 = 2;
    pub const STANDARD_BITS_PER_SAMPLE: u16 = 16;

    /// Canonical renderer format at the given sample rate.
    pub fn standard(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: Self::STANDARD_CHANNELS,
            bits_per_sample: Self::STANDARD_BITS_PER_SAMPLE,
        }
    }

    /// Returns `true` if this is the canonical renderer layout.
    pub fn is_standard(&self) -> bool {
        self.channels == Self::STANDARD_CHANNELS
            && self.bits_per_sample == Self::STANDARD_BITS_PER_SAMPLE
    }

    /// Bytes occupied by one frame (one sample for every channel).
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    /// Bytes consumed per second of audio.
    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.bytes_per_frame() as u64
    }

    /// Duration in seconds represented by `bytes` of PCM.
    pub fn bytes_to_seconds(&self, bytes: usize) -> f64 {
        let rate = self.byte_rate();
        if rate == 0 {
            return 0.0;
        }
        bytes as f64 / rate as f64
    }

    /// Frame-aligned byte count covering `seconds` of audio.
    pub fn seconds_to_bytes(&self, seconds: f64) -> usize {
        if seconds <= 0.0 || self.sample_rate == 0 {
            return 0;
        }
        let frames = (seconds * self.sample_rate as f64).round() as usize;
        frames * self.bytes_per_frame()
    }

    /// Duration in seconds represented by `frames` PCM frames.
    pub fn frames_to_seconds(&self, frames: u64) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        frames as f64 / self.sample_rate as f64
    }
}
