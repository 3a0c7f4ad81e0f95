//! Byte acquisition contracts.
//!
//! A transport fetches the bytes behind an [`AudioSource`] and pushes them, in
//! order, into a [`TransportSink`]. The playback core implements the sink; hosts
//! implement the transport (file reader, HTTP client, media library exporter).
//!
//! ## Callback contract
//!
//! 1. `on_response` at most once, before any data.
//! 2. `on_data` zero or more times with consecutive byte ranges.
//! 3. `on_progress` optionally, interleaved with data.
//! 4. Exactly one of `on_complete` / `on_failed`, unless the fetch was
//!    cancelled, in which case neither is required.
//!
//! Sinks must tolerate callbacks arriving after the consumer has been torn
//! down; they are expected to check a liveness flag and drop the call.

use crate::error::{BridgeError, Result};
use crate::platform::{PlatformSend, PlatformSendSync};
use crate::playback::AudioSource;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Response metadata reported before the first byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    /// Protocol status code. Local transports report `200`.
    pub status_code: u16,
    /// Total number of bytes the transport expects to deliver, when known.
    pub content_length: Option<u64>,
    /// MIME type reported by the remote end (e.g., `audio/wav`).
    pub mime_type: Option<String>,
    /// Raw response headers, if the transport has any.
    pub headers: HashMap<String, String>,
}

impl TransportResponse {
    /// Successful response with an optional known length.
    pub fn ok(content_length: Option<u64>) -> Self {
        Self {
            status_code: 200,
            content_length,
            ..Default::default()
        }
    }

    /// Attach a MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Returns `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Receiver side of a transport.
pub trait TransportSink: PlatformSendSync {
    /// Response metadata became available.
    fn on_response(&self, response: TransportResponse);

    /// The next consecutive range of bytes arrived.
    fn on_data(&self, bytes: &[u8]);

    /// Transfer progress in `[0, 1]`, when the transport can compute it.
    fn on_progress(&self, _ratio: f64) {}

    /// All bytes have been delivered.
    fn on_complete(&self);

    /// The transfer failed and will not be retried.
    fn on_failed(&self, error: BridgeError);
}

/// Host-provided byte transport.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AudioTransport: PlatformSendSync {
    /// Returns `true` if this transport can fetch `source`.
    fn supports(&self, source: &AudioSource) -> bool;

    /// Fetch `source`, driving `sink` through the callback contract above.
    ///
    /// Returns once the transfer completed, failed, or `cancel` fired.
    /// Failures are reported to the sink *and* returned; cancellation returns
    /// [`BridgeError::Cancelled`] without notifying the sink.
    async fn fetch(
        &self,
        source: &AudioSource,
        sink: Arc<dyn TransportSink>,
        cancel: CancellationToken,
    ) -> Result<()>;
}

/// Persistence target for acquired bytes (e.g., a cache file on disk).
pub trait CacheWriter: PlatformSend {
    /// Write `bytes` at absolute `offset`.
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()>;

    /// Flush written bytes to durable storage.
    fn sync(&mut self) -> Result<()>;
}

/// Opens cache writers for sources, e.g. one file per URL under a cache
/// directory.
pub trait CacheStore: PlatformSendSync {
    /// Create (or truncate) the cache entry for `source`.
    fn open(&self, source: &AudioSource) -> Result<Box<dyn CacheWriter>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_success_range() {
        assert!(TransportResponse::ok(Some(10)).is_success());

        let not_found = TransportResponse {
            status_code: 404,
            ..Default::default()
        };
        assert!(!not_found.is_success());
    }

    #[test]
    fn response_builder_sets_mime() {
        let response = TransportResponse::ok(None).with_mime_type("audio/wav");
        assert_eq!(response.mime_type.as_deref(), Some("audio/wav"));
        assert_eq!(response.content_length, None);
    }
}
