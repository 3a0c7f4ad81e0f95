//! # Acquisition Tracker
//!
//! Accumulates the bytes a transport delivers for one source and exposes them
//! for random-access reads while the transfer is still running.
//!
//! The tracker is source agnostic: any [`AudioTransport`](bridge_traits::AudioTransport)
//! drives it through the [`TransportSink`] callbacks. It records the expected
//! length, terminal flags and a sliding-window transfer-rate estimate, and
//! optionally mirrors every byte into a [`CacheWriter`].
//!
//! ## Invariants
//!
//! - `received_length` only grows until [`AcquisitionTracker::reset`]
//! - once the expected length is known, `received_length <= expected_length`
//!   (over-delivery raises the expectation)
//! - `finished` and `failed` are set at most once and never cleared; feeds
//!   arriving afterwards are dropped

use bridge_traits::time::Clock;
use bridge_traits::{BridgeError, CacheWriter, TransportResponse, TransportSink};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core_runtime::events::{AcquisitionEvent, EventBus};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Point-in-time copy of the acquisition counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcquisitionState {
    /// Bytes received so far.
    pub received_length: u64,
    /// Total bytes expected, `0` while unknown.
    pub expected_length: u64,
    /// The transfer failed; no more bytes will arrive.
    pub failed: bool,
    /// Every byte arrived; no more bytes will arrive.
    pub finished: bool,
    /// Average bytes per second over the recent arrivals.
    pub speed_estimate: f64,
    /// Transport status code, `0` until a response is seen.
    pub status_code: u16,
    /// Transfer progress in `[0, 1]`.
    pub progress: f64,
    /// MIME type reported by the transport.
    pub mime_type: Option<String>,
    /// Failure description, when `failed`.
    pub failure: Option<String>,
}

impl AcquisitionState {
    /// `true` once the transfer reached a terminal flag.
    pub fn is_terminal(&self) -> bool {
        self.finished || self.failed
    }
}

struct TrackerInner {
    buffer: Vec<u8>,
    state: AcquisitionState,
    arrivals: VecDeque<(DateTime<Utc>, usize)>,
    cache: Option<Box<dyn CacheWriter>>,
}

/// Growable, randomly readable byte buffer fed by a transport.
pub struct AcquisitionTracker {
    inner: Mutex<TrackerInner>,
    clock: Arc<dyn Clock>,
    speed_window: usize,
    events: Option<EventBus>,
    updated: Notify,
}

impl AcquisitionTracker {
    /// Create an empty tracker averaging the speed over `speed_window`
    /// arrivals.
    pub fn new(clock: Arc<dyn Clock>, speed_window: usize) -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                buffer: Vec::new(),
                state: AcquisitionState::default(),
                arrivals: VecDeque::with_capacity(speed_window.max(2)),
                cache: None,
            }),
            clock,
            speed_window: speed_window.max(2),
            events: None,
            updated: Notify::new(),
        }
    }

    /// Publish acquisition milestones on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Mirror every fed byte range into `cache`.
    pub fn with_cache(self, cache: Box<dyn CacheWriter>) -> Self {
        self.inner.lock().cache = Some(cache);
        self
    }

    /// Record response metadata.
    ///
    /// A non-success status code marks the acquisition failed.
    pub fn on_response_received(&self, response: &TransportResponse) {
        {
            let mut inner = self.inner.lock();
            if inner.state.is_terminal() {
                warn!(
                    status = response.status_code,
                    "Response after terminal acquisition state ignored"
                );
                return;
            }

            inner.state.status_code = response.status_code;
            inner.state.mime_type = response.mime_type.clone();
            if let Some(length) = response.content_length {
                inner.state.expected_length = length.max(inner.state.received_length);
            }
        }

        debug!(
            status = response.status_code,
            content_length = ?response.content_length,
            "Transport response received"
        );
        self.publish(AcquisitionEvent::ResponseReceived {
            status_code: response.status_code,
            content_length: response.content_length,
        });

        if !response.is_success() {
            self.mark_failed(format!("transport returned status {}", response.status_code));
        }
        self.updated.notify_waiters();
    }

    /// Append the next consecutive range of bytes.
    pub fn feed_bytes(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let now = self.clock.now();
        {
            let mut inner = self.inner.lock();
            if inner.state.is_terminal() {
                warn!(len = bytes.len(), "Bytes after terminal acquisition state ignored");
                return;
            }

            let offset = inner.buffer.len() as u64;
            inner.buffer.extend_from_slice(bytes);
            let received = inner.buffer.len() as u64;
            inner.state.received_length = received;
            if inner.state.expected_length != 0 && received > inner.state.expected_length {
                debug!(received, "Transport delivered more than announced");
                inner.state.expected_length = received;
            }

            inner.arrivals.push_back((now, bytes.len()));
            while inner.arrivals.len() > self.speed_window {
                inner.arrivals.pop_front();
            }
            if let Some(speed) = self.window_speed(&inner.arrivals) {
                inner.state.speed_estimate = speed;
            }
            if inner.state.expected_length > 0 {
                inner.state.progress =
                    (received as f64 / inner.state.expected_length as f64).min(1.0);
            }

            let write_result = inner
                .cache
                .as_mut()
                .map(|cache| cache.write_at(offset, bytes));
            if let Some(Err(err)) = write_result {
                warn!(error = %err, "Cache write failed, disabling cache");
                inner.cache = None;
            }
        }

        self.updated.notify_waiters();
    }

    /// Record transport-computed progress.
    pub fn set_progress(&self, ratio: f64) {
        let mut inner = self.inner.lock();
        if !inner.state.is_terminal() {
            inner.state.progress = ratio.clamp(0.0, 1.0);
        }
    }

    /// All bytes have arrived. The expected length becomes exact.
    pub fn mark_finished(&self) {
        let received = {
            let mut inner = self.inner.lock();
            if inner.state.is_terminal() {
                return;
            }
            inner.state.finished = true;
            inner.state.expected_length = inner.state.received_length;
            inner.state.progress = 1.0;

            if let Some(cache) = inner.cache.as_mut() {
                if let Err(err) = cache.sync() {
                    warn!(error = %err, "Cache sync failed");
                }
            }
            inner.state.received_length
        };

        info!(received, "Acquisition finished");
        self.publish(AcquisitionEvent::Completed {
            received_length: received,
        });
        self.updated.notify_waiters();
    }

    /// The transfer failed; no retry happens here.
    pub fn mark_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        {
            let mut inner = self.inner.lock();
            if inner.state.is_terminal() {
                return;
            }
            inner.state.failed = true;
            inner.state.failure = Some(reason.clone());
        }

        warn!(reason = %reason, "Acquisition failed");
        self.publish(AcquisitionEvent::Failed { message: reason });
        self.updated.notify_waiters();
    }

    /// Read up to `length` bytes at `offset`.
    ///
    /// Returns a short (possibly empty) read when the window has not fully
    /// arrived yet; the caller retries later.
    pub fn read_bytes(&self, offset: u64, length: usize) -> Bytes {
        let inner = self.inner.lock();
        let received = inner.buffer.len() as u64;
        if offset >= received || length == 0 {
            return Bytes::new();
        }

        let start = offset as usize;
        let end = (offset.saturating_add(length as u64)).min(received) as usize;
        Bytes::copy_from_slice(&inner.buffer[start..end])
    }

    /// Snapshot of the counters.
    pub fn state(&self) -> AcquisitionState {
        self.inner.lock().state.clone()
    }

    pub fn received_length(&self) -> u64 {
        self.inner.lock().state.received_length
    }

    /// Expected total, `None` while unknown.
    pub fn expected_length(&self) -> Option<u64> {
        let expected = self.inner.lock().state.expected_length;
        (expected > 0).then_some(expected)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.lock().state.finished
    }

    pub fn is_failed(&self) -> bool {
        self.inner.lock().state.failed
    }

    pub fn speed_estimate(&self) -> f64 {
        self.inner.lock().state.speed_estimate
    }

    /// Drop all bytes and counters.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.buffer.clear();
        inner.state = AcquisitionState::default();
        inner.arrivals.clear();
    }

    /// Wait until the tracker changes or `timeout` elapses.
    pub async fn wait_for_update(&self, timeout: Duration) {
        let _ = tokio::time::timeout(timeout, self.updated.notified()).await;
    }

    fn window_speed(&self, arrivals: &VecDeque<(DateTime<Utc>, usize)>) -> Option<f64> {
        let (first_at, _) = arrivals.front()?;
        let (last_at, _) = arrivals.back()?;
        let span = last_at.signed_duration_since(*first_at).num_microseconds()? as f64 / 1e6;
        if span <= 0.0 {
            return None;
        }
        // Bytes of the oldest arrival were transferred before the window opened.
        let bytes: usize = arrivals.iter().skip(1).map(|(_, len)| *len).sum();
        Some(bytes as f64 / span)
    }

    fn publish(&self, event: AcquisitionEvent) {
        if let Some(events) = &self.events {
            events.emit_acquisition(event);
        }
    }
}

impl TransportSink for AcquisitionTracker {
    fn on_response(&self, response: TransportResponse) {
        self.on_response_received(&response);
    }

    fn on_data(&self, bytes: &[u8]) {
        self.feed_bytes(bytes);
    }

    fn on_progress(&self, ratio: f64) {
        self.set_progress(ratio);
    }

    fn on_complete(&self) {
        self.mark_finished();
    }

    fn on_failed(&self, error: BridgeError) {
        self.mark_failed(error.to_string());
    }
}

impl std::fmt::Debug for AcquisitionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquisitionTracker")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::ManualClock;

    fn new_tracker() -> (Arc<ManualClock>, AcquisitionTracker) {
        let clock = Arc::new(ManualClock::default());
        let tracker = AcquisitionTracker::new(clock.clone(), 4);
        (clock, tracker)
    }

    #[derive(Default)]
    struct RecordingCache {
        writes: Arc<Mutex<Vec<(u64, usize)>>>,
        synced: Arc<Mutex<bool>>,
    }

    impl CacheWriter for RecordingCache {
        fn write_at(&mut self, offset: u64, bytes: &[u8]) -> bridge_traits::error::Result<()> {
            self.writes.lock().push((offset, bytes.len()));
            Ok(())
        }

        fn sync(&mut self) -> bridge_traits::error::Result<()> {
            *self.synced.lock() = true;
            Ok(())
        }
    }

    #[test]
    fn feed_and_read_back() {
        let (_, tracker) = new_tracker();
        tracker.feed_bytes(b"RIFF");
        tracker.feed_bytes(b"WAVE");

        assert_eq!(tracker.received_length(), 8);
        assert_eq!(&tracker.read_bytes(2, 4)[..], b"FFWA");
        assert_eq!(&tracker.read_bytes(6, 100)[..], b"VE");
        assert!(tracker.read_bytes(8, 4).is_empty());
    }

    #[test]
    fn response_sets_expected_length_and_rejects_errors() {
        let (_, tracker) = new_tracker();
        tracker.on_response(TransportResponse::ok(Some(1000)).with_mime_type("audio/wav"));

        let state = tracker.state();
        assert_eq!(state.expected_length, 1000);
        assert_eq!(state.status_code, 200);
        assert_eq!(state.mime_type.as_deref(), Some("audio/wav"));
        assert!(!state.failed);

        let (_, failing) = new_tracker();
        failing.on_response(TransportResponse {
            status_code: 404,
            ..Default::default()
        });
        assert!(failing.is_failed());
    }

    #[test]
    fn over_delivery_raises_expectation() {
        let (_, tracker) = new_tracker();
        tracker.on_response(TransportResponse::ok(Some(4)));
        tracker.feed_bytes(&[0; 6]);

        let state = tracker.state();
        assert_eq!(state.received_length, 6);
        assert_eq!(state.expected_length, 6);
    }

    #[test]
    fn terminal_flags_are_sticky() {
        let (_, tracker) = new_tracker();
        tracker.feed_bytes(&[1, 2, 3]);
        tracker.mark_finished();
        tracker.mark_failed("late failure");
        tracker.feed_bytes(&[4, 5]);

        let state = tracker.state();
        assert!(state.finished);
        assert!(!state.failed);
        assert_eq!(state.received_length, 3);
        assert_eq!(state.expected_length, 3);
        assert_eq!(state.progress, 1.0);
    }

    #[test]
    fn speed_uses_sliding_window() {
        let (clock, tracker) = new_tracker();

        tracker.feed_bytes(&[0; 1000]);
        assert_eq!(tracker.speed_estimate(), 0.0);

        clock.advance(Duration::from_secs(1));
        tracker.feed_bytes(&[0; 1000]);
        assert!((tracker.speed_estimate() - 1000.0).abs() < 1e-6);

        // Window of 4: only the latest arrivals count.
        for _ in 0..4 {
            clock.advance(Duration::from_millis(500));
            tracker.feed_bytes(&[0; 4000]);
        }
        assert!((tracker.speed_estimate() - 8000.0).abs() < 1e-6);
    }

    #[test]
    fn cache_receives_every_range() {
        let cache = RecordingCache::default();
        let writes = cache.writes.clone();
        let synced = cache.synced.clone();

        let (_, tracker) = new_tracker();
        let tracker = tracker.with_cache(Box::new(cache));
        tracker.feed_bytes(&[0; 10]);
        tracker.feed_bytes(&[0; 5]);
        tracker.mark_finished();

        assert_eq!(*writes.lock(), vec![(0, 10), (10, 5)]);
        assert!(*synced.lock());
    }

    #[tokio::test]
    async fn events_are_published() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let (_, tracker) = new_tracker();
        let tracker = tracker.with_events(bus.clone());

        tracker.on_failed(BridgeError::Transport("connection reset".to_string()));

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            core_runtime::events::CoreEvent::Acquisition(AcquisitionEvent::Failed { .. })
        ));
        assert_eq!(
            tracker.state().failure.as_deref(),
            Some("Transport error: connection reset")
        );
    }
}
