//! # Playback Session
//!
//! One session plays one [`AudioSource`]. It owns the acquisition tracker,
//! format parser, frame decoder, PCM queue and renderer for that source, and
//! drives the transport state machine:
//!
//! ```text
//!            play()              ratio reaches 1
//!   Idle ───────────▶ Buffering ───────────────▶ Playing
//!                       ▲   │  ◀─────────────────  │
//!               play()  │   │ pause()  underflow   │ pause() / interruption
//!                       │   ▼                      ▼
//!                       └─ Paused ◀────────────────┘
//!
//!   any ──▶ Finished   decoder ended and every PCM byte played
//!   Paused, Playing, Finished ──▶ Buffering   seek_to_time()
//!   Buffering ──▶ Paused   pre-roll full while the output is interrupted
//!   any ──▶ Error      format unavailable, decode failure, acquisition failure
//!   any ──▶ Idle       stop()
//! ```
//!
//! ## Concurrency
//!
//! - the transport task feeds the tracker through a sink that drops calls
//!   once the session is cancelled
//! - a tokio worker runs [`SessionShared::step`] repeatedly; each step holds
//!   the pipeline lock while it parses, decodes and feeds the renderer
//! - seek, pause and stop take the same lock, so they never interleave with
//!   a half-finished step; seeks also advance the queue epoch so any frame
//!   decoded against the old cursor is discarded
//! - the device's real-time callback only touches the renderer's ring buffer

use crate::acquisition::AcquisitionTracker;
use crate::config::StreamerConfig;
use crate::decoder::{DecodeStatus, FormatHint, FrameDecoder, SymphoniaCodecFactory};
use crate::error::{FailureKind, PlaybackError, Result, SessionFailure};
use crate::parser::{FormatParser, ParserState};
use crate::pcm_queue::{PcmQueue, QueueRead};
use crate::renderer::Renderer;
use bridge_traits::{
    AudioSource, AudioTransport, BridgeError, CodecFactory, TransportResponse, TransportSink,
    TransportStatus,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, PlaybackEvent};
use core_runtime::logging::{redact_if_sensitive, strip_path};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Upper bound on frames decoded while the pipeline lock is held.
const MAX_FRAMES_PER_STEP: usize = 8;

/// Minimum ratio change worth a buffering event.
const RATIO_EVENT_STEP: f64 = 0.01;

/// Consistent copy of every observable session property.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub status: TransportStatus,
    /// Seconds of audio played, including the seek origin.
    pub current_time: f64,
    /// Seconds, 0 while unknown.
    pub duration: f64,
    pub duration_is_final: bool,
    /// Buffered PCM relative to the pre-roll target, in `[0, 1]`.
    pub buffering_ratio: f64,
    pub received_length: u64,
    /// Bytes, 0 while unknown.
    pub expected_length: u64,
    /// Bytes per second.
    pub download_speed: f64,
    pub volume: f32,
    pub interrupted: bool,
    pub failure: Option<SessionFailure>,
}

struct Pipeline {
    parser: FormatParser,
    decoder: Option<FrameDecoder>,
    renderer: Renderer,
    /// Seek requested before the format was known.
    pending_seek: Option<f64>,
}

#[derive(Debug, Default)]
struct Progress {
    duration: f64,
    duration_is_final: bool,
    buffering_ratio: f64,
}

struct StatusCell {
    status: TransportStatus,
    failure: Option<SessionFailure>,
}

enum Step {
    /// Work was done; run again soon.
    Progressed,
    /// Nothing to do until more bytes arrive or the device drains.
    Idle,
    /// The session reached a terminal status.
    Done,
}

/// State shared by the session handle, its worker and its transport task.
struct SessionShared {
    source: AudioSource,
    config: StreamerConfig,
    tracker: Arc<AcquisitionTracker>,
    queue: PcmQueue,
    pipeline: Mutex<Pipeline>,
    status: Mutex<StatusCell>,
    progress: Mutex<Progress>,
    events: EventBus,
    cancel: CancellationToken,
}

impl SessionShared {
    fn status(&self) -> TransportStatus {
        self.status.lock().status
    }

    /// Apply one edge of the state machine and broadcast it.
    fn transition(&self, to: TransportStatus) -> bool {
        let mut cell = self.status.lock();
        let from = cell.status;
        if !from.can_transition_to(to) {
            if from != to {
                warn!(%from, %to, "Rejected status transition");
            }
            return false;
        }

        cell.status = to;
        info!(%from, %to, "Status changed");
        self.events
            .emit_playback(PlaybackEvent::StatusChanged { from, to });
        true
    }

    fn fail(&self, renderer: &mut Renderer, failure: SessionFailure) {
        renderer.pause();
        error!(kind = ?failure.kind, message = %failure.message, "Session failed");

        let message = failure.to_string();
        let recoverable = failure.is_recoverable();
        self.status.lock().failure = Some(failure);
        if self.transition(TransportStatus::Error) {
            self.events.emit_playback(PlaybackEvent::Error {
                message,
                recoverable,
            });
        }
        // Nothing more will be decoded; release the transfer.
        self.cancel.cancel();
    }

    /// One iteration of the worker loop.
    fn step(&self) -> Step {
        let mut guard = self.pipeline.lock();
        let pipeline = &mut *guard;

        let status = self.status();
        if matches!(
            status,
            TransportStatus::Idle | TransportStatus::Finished | TransportStatus::Error
        ) {
            return Step::Done;
        }

        let acquisition = self.tracker.state();
        if acquisition.failed {
            let reason = acquisition
                .failure
                .clone()
                .unwrap_or_else(|| "transfer failed".to_string());
            self.fail(
                &mut pipeline.renderer,
                SessionFailure::new(FailureKind::Acquisition, reason),
            );
            return Step::Done;
        }

        if pipeline.decoder.is_none() {
            match pipeline.parser.parse(&self.tracker) {
                ParserState::NotReady => return Step::Idle,
                ParserState::Unavailable => {
                    let reason = pipeline
                        .parser
                        .failure()
                        .unwrap_or("unrecognised stream")
                        .to_string();
                    self.fail(
                        &mut pipeline.renderer,
                        SessionFailure::new(FailureKind::Format, reason),
                    );
                    return Step::Done;
                }
                ParserState::Available => {
                    if let Err(err) = self.open_decoder(pipeline) {
                        let kind = FailureKind::from(&err);
                        self.fail(
                            &mut pipeline.renderer,
                            SessionFailure::new(kind, err.to_string()),
                        );
                        return Step::Done;
                    }
                }
            }
        }

        if let Some((duration, is_final)) = pipeline.parser.refresh_duration(&acquisition) {
            self.publish_duration(duration, is_final);
        }

        if status == TransportStatus::Paused {
            return Step::Idle;
        }

        let Some(decoder) = pipeline.decoder.as_mut() else {
            return Step::Idle;
        };
        let format = decoder.description().output_format;
        let high_water = format.seconds_to_bytes(self.config.queue_high_water);

        let mut progressed = false;
        for _ in 0..MAX_FRAMES_PER_STEP {
            if decoder.is_ended() || self.queue.queued_bytes() >= high_water {
                break;
            }
            match decoder.decode_once(&self.tracker, &self.queue) {
                DecodeStatus::Succeeded => progressed = true,
                DecodeStatus::Waiting => break,
                DecodeStatus::EndEncountered => {
                    progressed = true;
                    break;
                }
                DecodeStatus::Failed(reason) => {
                    self.fail(
                        &mut pipeline.renderer,
                        SessionFailure::new(FailureKind::Decode, reason),
                    );
                    return Step::Done;
                }
            }
        }
        let decoder_ended = decoder.is_ended();

        // Hand over whole chunks only, as fast as the renderer accepts them.
        while let Some(front) = self.queue.front_len() {
            if pipeline.renderer.free_bytes() < front {
                break;
            }
            match self.queue.read() {
                QueueRead::Chunk(chunk) => {
                    pipeline.renderer.render_bytes(&chunk.bytes);
                    self.queue.recycle(chunk);
                    progressed = true;
                }
                QueueRead::Empty | QueueRead::Ended => break,
            }
        }

        let buffered = self.queue.queued_bytes() + pipeline.renderer.buffered_bytes();
        match status {
            TransportStatus::Buffering => {
                let ratio = if decoder_ended {
                    1.0
                } else {
                    (format.bytes_to_seconds(buffered) / self.config.preroll).min(1.0)
                };
                self.publish_ratio(ratio);
                if ratio >= 1.0 && pipeline.renderer.is_interrupted() {
                    // The platform holds the output; only play() resumes.
                    info!("Pre-roll complete while interrupted, holding paused");
                    self.transition(TransportStatus::Paused);
                    progressed = true;
                } else if ratio >= 1.0 {
                    if let Err(err) = pipeline.renderer.start() {
                        self.fail(
                            &mut pipeline.renderer,
                            SessionFailure::new(FailureKind::Output, err.to_string()),
                        );
                        return Step::Done;
                    }
                    self.transition(TransportStatus::Playing);
                    progressed = true;
                }
            }
            TransportStatus::Playing if buffered == 0 => {
                pipeline.renderer.pause();
                if decoder_ended {
                    info!(elapsed = pipeline.renderer.elapsed(), "Playback finished");
                    self.transition(TransportStatus::Finished);
                    self.publish_position(pipeline.renderer.elapsed());
                    return Step::Done;
                }
                warn!(
                    underruns = pipeline.renderer.underruns(),
                    "PCM underflow, rebuffering"
                );
                self.transition(TransportStatus::Buffering);
                self.publish_ratio(0.0);
            }
            _ => {}
        }

        if progressed {
            Step::Progressed
        } else {
            Step::Idle
        }
    }

    fn open_decoder(&self, pipeline: &mut Pipeline) -> Result<()> {
        let description = pipeline
            .parser
            .description()
            .ok_or_else(|| PlaybackError::Internal("format description missing".to_string()))?;
        let codec = pipeline
            .parser
            .take_codec()
            .ok_or_else(|| PlaybackError::Internal("codec already taken".to_string()))?;

        pipeline.renderer.prepare(description.output_format)?;
        let mut decoder = FrameDecoder::new(codec, description, self.config.read_window_bytes);

        let (duration, is_final) = pipeline.parser.duration();
        self.publish_duration(duration, is_final);

        if let Some(target) = pipeline.pending_seek.take() {
            let time = decoder.seek_to_time(target, duration, &self.queue);
            pipeline.renderer.set_time_base(time);
            self.events.emit_playback(PlaybackEvent::SeekCompleted {
                position_ms: seconds_to_ms(time),
            });
        }

        pipeline.decoder = Some(decoder);
        Ok(())
    }

    fn publish_duration(&self, duration: f64, is_final: bool) {
        {
            let mut progress = self.progress.lock();
            progress.duration = duration;
            progress.duration_is_final = is_final;
        }
        debug!(duration, is_final, "Duration updated");
        self.events.emit_playback(PlaybackEvent::DurationChanged {
            duration_ms: seconds_to_ms(duration),
            is_final,
        });
    }

    fn publish_ratio(&self, ratio: f64) {
        let ratio = ratio.clamp(0.0, 1.0);
        let changed = {
            let mut progress = self.progress.lock();
            let previous = progress.buffering_ratio;
            progress.buffering_ratio = ratio;
            (ratio - previous).abs() >= RATIO_EVENT_STEP || (ratio >= 1.0 && previous < 1.0)
        };
        if changed {
            self.events
                .emit_playback(PlaybackEvent::BufferingProgress { ratio });
        }
    }

    fn publish_position(&self, position: f64) {
        let duration = self.progress.lock().duration;
        self.events.emit_playback(PlaybackEvent::PositionChanged {
            position_ms: seconds_to_ms(position),
            duration_ms: seconds_to_ms(duration),
        });
    }
}

/// Transport sink that ignores callbacks once the session is torn down.
struct SessionSink {
    tracker: Arc<AcquisitionTracker>,
    cancel: CancellationToken,
}

impl SessionSink {
    fn live(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl TransportSink for SessionSink {
    fn on_response(&self, response: TransportResponse) {
        if self.live() {
            TransportSink::on_response(&*self.tracker, response);
        }
    }

    fn on_data(&self, bytes: &[u8]) {
        if self.live() {
            self.tracker.feed_bytes(bytes);
        }
    }

    fn on_progress(&self, ratio: f64) {
        if self.live() {
            self.tracker.set_progress(ratio);
        }
    }

    fn on_complete(&self) {
        if self.live() {
            self.tracker.mark_finished();
        }
    }

    fn on_failed(&self, error: BridgeError) {
        if self.live() {
            TransportSink::on_failed(&*self.tracker, error);
        }
    }
}

/// Playback of one source.
pub struct PlaybackSession {
    shared: Arc<SessionShared>,
    transport: Arc<dyn AudioTransport>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PlaybackSession {
    /// Assemble a session for `source` from the runtime collaborators.
    ///
    /// The session starts `Idle`; nothing is fetched until [`start`](Self::start).
    pub fn new(
        source: AudioSource,
        core: &CoreConfig,
        config: StreamerConfig,
        events: EventBus,
    ) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;
        let transport = core
            .transport_for(&source)
            .map_err(|err| PlaybackError::SourceError(err.to_string()))?;

        let mut tracker =
            AcquisitionTracker::new(core.clock.clone(), config.speed_window).with_events(events.clone());
        if let Some(store) = &core.cache_store {
            match store.open(&source) {
                Ok(writer) => tracker = tracker.with_cache(writer),
                Err(err) => warn!(error = %err, "Cache unavailable, playing uncached"),
            }
        }

        let mut factories: Vec<Arc<dyn CodecFactory>> = core.codec_factories.clone();
        factories.extend(SymphoniaCodecFactory::defaults());
        let parser = FormatParser::new(
            factories,
            FormatHint::new(source.file_extension(), None),
            config.max_header_bytes,
        );
        let renderer = Renderer::new(core.output_device.clone(), config.renderer_buffer);

        Ok(Self {
            shared: Arc::new(SessionShared {
                source,
                config,
                tracker: Arc::new(tracker),
                queue: PcmQueue::new(),
                pipeline: Mutex::new(Pipeline {
                    parser,
                    decoder: None,
                    renderer,
                    pending_seek: None,
                }),
                status: Mutex::new(StatusCell {
                    status: TransportStatus::Idle,
                    failure: None,
                }),
                progress: Mutex::new(Progress::default()),
                events,
                cancel: CancellationToken::new(),
            }),
            transport,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Begin acquisition and decoding: `Idle -> Buffering`.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self), fields(source = %loggable_url(&self.shared.source)))]
    pub fn start(&mut self) -> Result<()> {
        let status = self.shared.status();
        if status != TransportStatus::Idle || !self.tasks.get_mut().is_empty() {
            return Err(PlaybackError::InvalidTransition {
                from: status.to_string(),
                to: TransportStatus::Buffering.to_string(),
            });
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| PlaybackError::Internal(format!("no tokio runtime: {err}")))?;

        self.shared.transition(TransportStatus::Buffering);

        let sink: Arc<dyn TransportSink> = Arc::new(SessionSink {
            tracker: self.shared.tracker.clone(),
            cancel: self.shared.cancel.clone(),
        });
        let transport = self.transport.clone();
        let source = self.shared.source.clone();
        let tracker = self.shared.tracker.clone();
        let cancel = self.shared.cancel.clone();
        let tasks = self.tasks.get_mut();
        tasks.push(runtime.spawn(async move {
            match transport.fetch(&source, sink, cancel.clone()).await {
                Ok(()) => debug!("Transport completed"),
                Err(err) if err.is_cancelled() || cancel.is_cancelled() => {
                    debug!("Transport cancelled")
                }
                // Usually already reported through the sink; the tracker
                // ignores the repeat.
                Err(err) => tracker.mark_failed(err.to_string()),
            }
        }));

        tasks.push(runtime.spawn(run_worker(self.shared.clone())));
        info!("Session started");
        Ok(())
    }

    /// Resume a paused session: `Paused -> Buffering`.
    ///
    /// Clears an output interruption. No-op while already buffering or playing.
    #[instrument(skip(self))]
    pub fn play(&self) -> Result<()> {
        let mut pipeline = self.shared.pipeline.lock();
        match self.shared.status() {
            TransportStatus::Paused => {
                if pipeline.renderer.is_interrupted() {
                    pipeline.renderer.set_interrupted(false);
                    self.shared
                        .events
                        .emit_playback(PlaybackEvent::Interrupted { interrupted: false });
                }
                self.shared.transition(TransportStatus::Buffering);
                Ok(())
            }
            TransportStatus::Buffering | TransportStatus::Playing => Ok(()),
            other => Err(PlaybackError::InvalidTransition {
                from: other.to_string(),
                to: TransportStatus::Buffering.to_string(),
            }),
        }
    }

    /// Stop output without discarding buffered audio and suspend decoding.
    ///
    /// No-op while already paused.
    #[instrument(skip(self))]
    pub fn pause(&self) -> Result<()> {
        let mut pipeline = self.shared.pipeline.lock();
        match self.shared.status() {
            TransportStatus::Paused => Ok(()),
            TransportStatus::Buffering | TransportStatus::Playing => {
                pipeline.renderer.pause();
                self.shared.transition(TransportStatus::Paused);
                Ok(())
            }
            other => Err(PlaybackError::InvalidTransition {
                from: other.to_string(),
                to: TransportStatus::Paused.to_string(),
            }),
        }
    }

    /// Jump to `seconds`, clamped to the known duration.
    ///
    /// Valid in every state but `Idle` and `Error`. Playing, paused and
    /// finished sessions re-enter `Buffering`; while the output is
    /// interrupted the session settles in `Paused` once the pre-roll is full.
    ///
    /// Returns the time playback will resume from. Before the format is
    /// known the duration is too, so the returned target is provisional: it
    /// is only clamped to zero here, and the decoder clamps it to the
    /// duration once the header is parsed.
    #[instrument(skip(self))]
    pub fn seek_to_time(&self, seconds: f64) -> Result<f64> {
        let mut guard = self.shared.pipeline.lock();
        let pipeline = &mut *guard;

        let status = self.shared.status();
        if matches!(status, TransportStatus::Idle | TransportStatus::Error) {
            return Err(PlaybackError::InvalidTransition {
                from: status.to_string(),
                to: "seek".to_string(),
            });
        }
        // The worker exits on Finished; a seek needs a new one.
        let runtime = if status == TransportStatus::Finished {
            Some(
                tokio::runtime::Handle::try_current()
                    .map_err(|err| PlaybackError::Internal(format!("no tokio runtime: {err}")))?,
            )
        } else {
            None
        };

        let Some(decoder) = pipeline.decoder.as_mut() else {
            let target = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
            debug!(target, "Format unknown, deferring seek");
            pipeline.pending_seek = Some(target);
            pipeline.renderer.set_time_base(target);
            if status == TransportStatus::Paused {
                self.shared.transition(TransportStatus::Buffering);
            }
            return Ok(target);
        };

        let duration = self.shared.progress.lock().duration;
        if status == TransportStatus::Playing {
            pipeline.renderer.pause();
        }
        let time = decoder.seek_to_time(seconds, duration, &self.shared.queue);
        pipeline.renderer.flush(false);
        pipeline.renderer.set_time_base(time);
        self.shared.progress.lock().buffering_ratio = 0.0;

        if matches!(
            status,
            TransportStatus::Playing | TransportStatus::Paused | TransportStatus::Finished
        ) {
            self.shared.transition(TransportStatus::Buffering);
        }
        if let Some(runtime) = runtime {
            let worker = runtime.spawn(run_worker(self.shared.clone()));
            let mut tasks = self.tasks.lock();
            tasks.retain(|task| !task.is_finished());
            tasks.push(worker);
        }
        self.shared.events.emit_playback(PlaybackEvent::SeekCompleted {
            position_ms: seconds_to_ms(time),
        });
        Ok(time)
    }

    /// Tear the session down: `any -> Idle`.
    ///
    /// Cancels the transfer and the worker, stops and flushes the renderer.
    /// No-op once idle.
    #[instrument(skip(self))]
    pub fn stop(&mut self) {
        self.shared.cancel.cancel();
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }

        let mut pipeline = self.shared.pipeline.lock();
        if self.shared.status() == TransportStatus::Idle {
            return;
        }
        pipeline.renderer.stop();
        self.shared.queue.flush();
        self.shared.transition(TransportStatus::Idle);
    }

    /// Record a platform audio interruption.
    ///
    /// A playing or buffering session pauses; ending the interruption does
    /// not resume playback.
    pub fn set_interrupted(&self, interrupted: bool) {
        let mut pipeline = self.shared.pipeline.lock();
        if pipeline.renderer.is_interrupted() == interrupted {
            return;
        }
        pipeline.renderer.set_interrupted(interrupted);
        self.shared
            .events
            .emit_playback(PlaybackEvent::Interrupted { interrupted });

        if interrupted
            && matches!(
                self.shared.status(),
                TransportStatus::Playing | TransportStatus::Buffering
            )
        {
            self.shared.transition(TransportStatus::Paused);
        }
    }

    /// Set the output gain, clamped to `[0, 1]`. Returns the stored value.
    pub fn set_volume(&self, volume: f32) -> f32 {
        self.shared.pipeline.lock().renderer.set_volume(volume)
    }

    pub fn status(&self) -> TransportStatus {
        self.shared.status()
    }

    pub fn source(&self) -> &AudioSource {
        &self.shared.source
    }

    pub fn current_time(&self) -> f64 {
        self.shared.pipeline.lock().renderer.elapsed()
    }

    pub fn failure(&self) -> Option<SessionFailure> {
        self.shared.status.lock().failure.clone()
    }

    /// Consistent copy of every observable property.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        let pipeline = self.shared.pipeline.lock();
        let (status, failure) = {
            let cell = self.shared.status.lock();
            (cell.status, cell.failure.clone())
        };
        let progress = self.shared.progress.lock();
        let acquisition = self.shared.tracker.state();

        PlaybackSnapshot {
            status,
            current_time: pipeline.renderer.elapsed(),
            duration: progress.duration,
            duration_is_final: progress.duration_is_final,
            buffering_ratio: progress.buffering_ratio,
            received_length: acquisition.received_length,
            expected_length: acquisition.expected_length,
            download_speed: acquisition.speed_estimate,
            volume: pipeline.renderer.volume(),
            interrupted: pipeline.renderer.is_interrupted(),
            failure,
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("source", &loggable_url(&self.shared.source))
            .field("status", &self.shared.status())
            .finish()
    }
}

async fn run_worker(shared: Arc<SessionShared>) {
    let backoff = shared.config.decode_backoff;
    let position_interval = shared.config.position_interval;
    let mut last_position = tokio::time::Instant::now();

    loop {
        if shared.cancel.is_cancelled() {
            break;
        }

        let step = shared.step();

        if last_position.elapsed() >= position_interval {
            last_position = tokio::time::Instant::now();
            if shared.status() == TransportStatus::Playing {
                let position = shared.pipeline.lock().renderer.elapsed();
                shared.publish_position(position);
            }
        }

        match step {
            Step::Done => break,
            Step::Progressed => tokio::task::yield_now().await,
            Step::Idle => {
                tokio::select! {
                    _ = shared.cancel.cancelled() => break,
                    _ = shared.tracker.wait_for_update(backoff) => {}
                }
            }
        }
    }

    debug!(status = %shared.status(), "Decode worker exited");
}

fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}

fn loggable_url(source: &AudioSource) -> String {
    match source {
        AudioSource::LocalFile { path } => strip_path(&path.to_string_lossy()).to_string(),
        AudioSource::RemoteUrl { url, .. } => redact_if_sensitive("url", url),
    }
}
