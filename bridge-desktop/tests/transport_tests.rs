use bridge_desktop::{CacheDirectory, FileTransport};
use bridge_traits::{
    AudioSource, AudioTransport, BridgeError, CacheStore, TransportResponse, TransportSink,
};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingSink {
    response: Mutex<Option<TransportResponse>>,
    data: Mutex<Vec<u8>>,
    chunks: Mutex<usize>,
    progress: Mutex<Vec<f64>>,
    completed: Mutex<bool>,
    failure: Mutex<Option<String>>,
}

impl TransportSink for RecordingSink {
    fn on_response(&self, response: TransportResponse) {
        *self.response.lock() = Some(response);
    }

    fn on_data(&self, bytes: &[u8]) {
        self.data.lock().extend_from_slice(bytes);
        *self.chunks.lock() += 1;
    }

    fn on_progress(&self, ratio: f64) {
        self.progress.lock().push(ratio);
    }

    fn on_complete(&self) {
        *self.completed.lock() = true;
    }

    fn on_failed(&self, error: BridgeError) {
        *self.failure.lock() = Some(error.to_string());
    }
}

#[tokio::test]
async fn file_transport_delivers_whole_file_in_chunks() {
    let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
    let body: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    file.write_all(&body).unwrap();
    file.flush().unwrap();

    let transport = FileTransport::with_chunk_size(4096);
    let sink = Arc::new(RecordingSink::default());
    let source = AudioSource::local(file.path());

    transport
        .fetch(&source, sink.clone(), CancellationToken::new())
        .await
        .unwrap();

    let response = sink.response.lock().clone().unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.content_length, Some(10_000));
    assert_eq!(response.mime_type.as_deref(), Some("audio/wav"));
    assert_eq!(*sink.data.lock(), body);
    assert!(*sink.chunks.lock() >= 3);
    assert_eq!(sink.progress.lock().last().copied(), Some(1.0));
    assert!(*sink.completed.lock());
    assert!(sink.failure.lock().is_none());
}

#[tokio::test]
async fn file_transport_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FileTransport::new();
    let sink = Arc::new(RecordingSink::default());
    let source = AudioSource::local(dir.path().join("missing.wav"));

    let result = transport
        .fetch(&source, sink.clone(), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(BridgeError::Transport(_))));
    assert!(sink.failure.lock().is_some());
    assert!(!*sink.completed.lock());
    assert!(sink.response.lock().is_none());
}

#[tokio::test]
async fn file_transport_stops_when_cancelled() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[7u8; 1024]).unwrap();
    file.flush().unwrap();

    let transport = FileTransport::with_chunk_size(16);
    let sink = Arc::new(RecordingSink::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = transport
        .fetch(&AudioSource::local(file.path()), sink.clone(), cancel)
        .await;

    assert!(matches!(result, Err(BridgeError::Cancelled)));
    assert!(!*sink.completed.lock());
    assert!(sink.failure.lock().is_none());
}

#[tokio::test]
async fn file_transport_rejects_remote_sources() {
    let transport = FileTransport::new();
    let sink = Arc::new(RecordingSink::default());

    let result = transport
        .fetch(
            &AudioSource::remote("https://example.com/a.wav"),
            sink,
            CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(BridgeError::NotAvailable(_))));
}

#[test]
fn cache_directory_opens_one_file_per_source() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheDirectory::with_root(dir.path());
    let source = AudioSource::remote("https://example.com/track.wav");

    let mut writer = cache.open(&source).unwrap();
    writer.write_at(0, b"RIFF").unwrap();
    writer.sync().unwrap();

    let path = cache.path_for(&source);
    assert!(path.starts_with(dir.path()));
    assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");

    // Reopening truncates the previous entry.
    let mut writer = cache.open(&source).unwrap();
    writer.sync().unwrap();
    assert!(std::fs::read(&path).unwrap().is_empty());

    cache.clear().unwrap();
    assert!(!dir.path().exists());
}
