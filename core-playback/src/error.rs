//! # Playback Error Types
//!
//! Error types for the streaming pipeline and the session state machine.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// No transport can fetch the source.
    #[error("Failed to open audio source: {0}")]
    SourceError(String),

    /// The transfer failed (network error, non-success status, file vanished).
    #[error("Acquisition failed: {0}")]
    AcquisitionFailed(String),

    // ========================================================================
    // Format/Codec Errors
    // ========================================================================
    /// The container could not be recognised or its header is corrupt.
    #[error("Unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    /// No registered codec handles the stream.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// The stream ended before a complete header arrived.
    #[error("Stream ended before the header was complete")]
    HeaderTruncated,

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// The codec reported an unrecoverable frame error.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// The requested transition is not part of the transport state machine.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Operation requires an active session.
    #[error("No active session")]
    NoActiveSession,

    // ========================================================================
    // Platform/Adapter Errors
    // ========================================================================
    /// The hardware output path could not be opened or driven.
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// A bridge collaborator failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Runtime configuration or capability error.
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Configuration values are invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::AcquisitionFailed(_) | PlaybackError::AudioDeviceError(_)
        ) || matches!(self, PlaybackError::Bridge(BridgeError::Transport(_)))
    }

    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        matches!(self, PlaybackError::AcquisitionFailed(_))
            || matches!(self, PlaybackError::Bridge(BridgeError::Transport(_)))
    }

    /// Returns `true` if this error is related to audio format/codec issues.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidFormat(_)
                | PlaybackError::UnsupportedCodec(_)
                | PlaybackError::HeaderTruncated
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// What moved a session into `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Acquisition,
    Format,
    Decode,
    Output,
}

/// Terminal failure recorded on a session and surfaced in its error event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SessionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether replaying the same source might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind, FailureKind::Acquisition | FailureKind::Output)
    }
}

impl From<&PlaybackError> for FailureKind {
    fn from(error: &PlaybackError) -> Self {
        if error.is_format_error() {
            FailureKind::Format
        } else if error.is_network_error() {
            FailureKind::Acquisition
        } else {
            match error {
                PlaybackError::DecodingError(_) => FailureKind::Decode,
                PlaybackError::AudioDeviceError(_) => FailureKind::Output,
                PlaybackError::Bridge(BridgeError::AudioDevice(_)) => FailureKind::Output,
                _ => FailureKind::Decode,
            }
        }
    }
}

impl std::fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} failure: {}", self.kind, self.message)
    }
}
