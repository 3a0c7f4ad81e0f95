//! HTTP Transport Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    AudioSource, AudioTransport, TransportResponse, TransportSink,
};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Reqwest-based streaming transport for [`AudioSource::RemoteUrl`].
///
/// Issues a single GET per fetch and forwards the body as it arrives:
/// - Connection pooling via reqwest
/// - Per-source request headers
/// - TLS support by default
///
/// No retry is attempted; a failed transfer fails the session.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the default connect timeout.
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(Duration::from_secs(10))
    }

    /// Create a transport with a custom connect timeout.
    ///
    /// There is no overall request timeout; long tracks stream for as long as
    /// they play.
    pub fn with_connect_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .pool_max_idle_per_host(4)
            .user_agent("audio-streamer/0.1.0")
            .build()
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn response_metadata(
        status: u16,
        content_length: Option<u64>,
        headers: &HeaderMap,
    ) -> TransportResponse {
        let mime_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let headers: HashMap<String, String> = headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        TransportResponse {
            status_code: status,
            content_length,
            mime_type,
            headers,
        }
    }

    fn map_reqwest_error(e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Transport("Request timed out".to_string())
        } else if e.is_connect() {
            BridgeError::Transport(format!("Connection failed: {e}"))
        } else {
            BridgeError::Transport(e.to_string())
        }
    }

    async fn stream_into(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        sink: &dyn TransportSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut request = self.client.get(url);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
            response = request.send() => response.map_err(Self::map_reqwest_error)?,
        };

        let status = response.status().as_u16();
        let content_length = response.content_length();
        sink.on_response(Self::response_metadata(status, content_length, response.headers()));
        if !response.status().is_success() {
            return Err(BridgeError::Transport(format!("HTTP error: {}", response.status())));
        }

        let mut body = response.bytes_stream();
        let mut delivered = 0u64;
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
                chunk = body.next() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => {
                    delivered += bytes.len() as u64;
                    sink.on_data(&bytes);
                    if let Some(total) = content_length.filter(|t| *t > 0) {
                        sink.on_progress((delivered as f64 / total as f64).min(1.0));
                    }
                }
                Some(Err(e)) => return Err(Self::map_reqwest_error(e)),
                None => break,
            }
        }

        if let Some(total) = content_length {
            if delivered < total {
                return Err(BridgeError::Transport(format!(
                    "Body ended after {delivered} of {total} bytes"
                )));
            }
        }

        debug!(bytes = delivered, "HTTP body complete");
        Ok(())
    }
}

#[async_trait]
impl AudioTransport for HttpTransport {
    fn supports(&self, source: &AudioSource) -> bool {
        match source {
            AudioSource::RemoteUrl { url, .. } => {
                let url = url.to_ascii_lowercase();
                url.starts_with("http://") || url.starts_with("https://")
            }
            AudioSource::LocalFile { .. } => false,
        }
    }

    async fn fetch(
        &self,
        source: &AudioSource,
        sink: Arc<dyn TransportSink>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let AudioSource::RemoteUrl { url, headers } = source else {
            return Err(BridgeError::NotAvailable(
                "HttpTransport only fetches remote URLs".to_string(),
            ));
        };

        match self.stream_into(url, headers, sink.as_ref(), &cancel).await {
            Ok(()) => {
                sink.on_complete();
                Ok(())
            }
            Err(BridgeError::Cancelled) => Err(BridgeError::Cancelled),
            Err(err) => {
                warn!(error = %err, "HTTP transfer failed");
                let message = err.to_string();
                sink.on_failed(err);
                Err(BridgeError::Transport(message))
            }
        }
    }
}
