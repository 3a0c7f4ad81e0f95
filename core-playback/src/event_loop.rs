//! # Event Loop
//!
//! Process-wide controller for playback. It owns at most one
//! [`PlaybackSession`] at a time and turns host commands into session
//! operations. Replacing the source tears the old session down before the new
//! one starts fetching.
//!
//! Observers subscribe to the shared [`EventBus`]; every session created by
//! the loop publishes on it.

use crate::config::StreamerConfig;
use crate::error::{PlaybackError, Result};
use crate::session::{PlaybackSession, PlaybackSnapshot};
use bridge_traits::{AudioSource, TransportStatus};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus};
use parking_lot::Mutex;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info, instrument};

/// Host-facing playback controller.
pub struct EventLoop {
    core: CoreConfig,
    config: StreamerConfig,
    events: EventBus,
    session: Mutex<Option<PlaybackSession>>,
    /// Applied to every new session.
    volume: Mutex<f32>,
}

impl EventLoop {
    pub fn new(core: CoreConfig, config: StreamerConfig) -> Result<Self> {
        core.validate()?;
        config.validate().map_err(PlaybackError::InvalidConfig)?;
        let events = EventBus::new(config.event_buffer);

        Ok(Self {
            core,
            config,
            events,
            session: Mutex::new(None),
            volume: Mutex::new(1.0),
        })
    }

    /// Start or resume playback.
    ///
    /// With a source, any current session is stopped and a new one starts
    /// buffering. Without one, a paused session resumes and a finished or
    /// failed session restarts its source from the beginning.
    #[instrument(skip(self, source))]
    pub fn play(&self, source: Option<AudioSource>) -> Result<()> {
        let mut slot = self.session.lock();

        let source = match source {
            Some(source) => source,
            None => {
                let session = slot.as_ref().ok_or(PlaybackError::NoActiveSession)?;
                match session.status() {
                    TransportStatus::Finished | TransportStatus::Error | TransportStatus::Idle => {
                        debug!(status = %session.status(), "Restarting current source");
                        session.source().clone()
                    }
                    _ => return session.play(),
                }
            }
        };

        if let Some(mut previous) = slot.take() {
            previous.stop();
        }

        let mut session =
            PlaybackSession::new(source, &self.core, self.config.clone(), self.events.clone())?;
        session.set_volume(*self.volume.lock());
        session.start()?;
        info!("New session started");
        *slot = Some(session);
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        match self.session.lock().as_ref() {
            Some(session) => session.pause(),
            None => Ok(()),
        }
    }

    /// Stop playback and return to `Idle`. No-op without a session.
    pub fn stop(&self) {
        if let Some(session) = self.session.lock().as_mut() {
            session.stop();
        }
    }

    /// Seek the current session. Returns the resulting position in seconds.
    pub fn seek_to_time(&self, seconds: f64) -> Result<f64> {
        self.with_session(|session| session.seek_to_time(seconds))
    }

    /// Set the output gain, clamped to `[0, 1]`. Returns the stored value.
    ///
    /// The gain carries over to sessions started later.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let stored = match self.session.lock().as_ref() {
            Some(session) => session.set_volume(volume),
            None if volume.is_nan() => 0.0,
            None => volume.clamp(0.0, 1.0),
        };
        *self.volume.lock() = stored;
        stored
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock()
    }

    /// Forward a platform audio interruption to the current session.
    pub fn set_interrupted(&self, interrupted: bool) {
        if let Some(session) = self.session.lock().as_ref() {
            session.set_interrupted(interrupted);
        }
    }

    /// Observable state of the current session, `None` before the first play.
    pub fn snapshot(&self) -> Option<PlaybackSnapshot> {
        self.session.lock().as_ref().map(PlaybackSession::snapshot)
    }

    pub fn status(&self) -> TransportStatus {
        self.session
            .lock()
            .as_ref()
            .map(PlaybackSession::status)
            .unwrap_or(TransportStatus::Idle)
    }

    pub fn current_time(&self) -> f64 {
        self.session
            .lock()
            .as_ref()
            .map(PlaybackSession::current_time)
            .unwrap_or(0.0)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn with_session<T>(&self, op: impl FnOnce(&PlaybackSession) -> Result<T>) -> Result<T> {
        let slot = self.session.lock();
        let session = slot.as_ref().ok_or(PlaybackError::NoActiveSession)?;
        op(session)
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("session", &*self.session.lock())
            .field("volume", &self.volume())
            .finish()
    }
}
