//! Local File Transport using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    AudioSource, AudioTransport, TransportResponse, TransportSink,
};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default read size per chunk.
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Tokio-based transport for [`AudioSource::LocalFile`].
///
/// Reads the file sequentially in fixed-size chunks, reporting the file size
/// as the content length and a synthetic `200` status.
#[derive(Debug, Clone)]
pub struct FileTransport {
    chunk_size: usize,
}

impl FileTransport {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a transport that delivers at most `chunk_size` bytes per callback.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    fn mime_type(path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "wav" | "wave" => Some("audio/wav"),
            "mp3" => Some("audio/mpeg"),
            "flac" => Some("audio/flac"),
            "ogg" | "oga" => Some("audio/ogg"),
            "m4a" | "aac" => Some("audio/mp4"),
            _ => None,
        }
    }

    async fn read_into(
        &self,
        path: &Path,
        sink: &dyn TransportSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut file = File::open(path).await?;
        let length = file.metadata().await?.len();

        let mut response = TransportResponse::ok(Some(length));
        response.mime_type = Self::mime_type(path).map(str::to_string);
        sink.on_response(response);

        let mut buf = vec![0u8; self.chunk_size];
        let mut delivered = 0u64;
        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
                read = file.read(&mut buf) => read?,
            };
            if read == 0 {
                break;
            }
            delivered += read as u64;
            sink.on_data(&buf[..read]);
            if length > 0 {
                sink.on_progress((delivered as f64 / length as f64).min(1.0));
            }
        }

        debug!(bytes = delivered, "Read local file");
        Ok(())
    }
}

impl Default for FileTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioTransport for FileTransport {
    fn supports(&self, source: &AudioSource) -> bool {
        matches!(source, AudioSource::LocalFile { .. })
    }

    async fn fetch(
        &self,
        source: &AudioSource,
        sink: Arc<dyn TransportSink>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let AudioSource::LocalFile { path } = source else {
            return Err(BridgeError::NotAvailable(
                "FileTransport only reads local files".to_string(),
            ));
        };

        match self.read_into(path, sink.as_ref(), &cancel).await {
            Ok(()) => {
                sink.on_complete();
                Ok(())
            }
            Err(BridgeError::Cancelled) => Err(BridgeError::Cancelled),
            Err(err) => {
                let message = err.to_string();
                sink.on_failed(err);
                Err(BridgeError::Transport(message))
            }
        }
    }
}
