//! # Host Bridge Traits
//!
//! Contracts between the playback core and the collaborators it does not
//! implement itself.
//!
//! ## Traits
//!
//! ### Acquisition
//! - [`AudioTransport`](transport::AudioTransport) - Fetches source bytes (file, HTTP, media library)
//! - [`TransportSink`](transport::TransportSink) - Receives bytes and completion/failure callbacks
//! - [`CacheWriter`](transport::CacheWriter) - Persists acquired bytes to disk
//!
//! ### Codec
//! - [`FrameCodec`](codec::FrameCodec) - Parses a container header and decodes one frame at a time
//! - [`CodecFactory`](codec::CodecFactory) - Creates codec instances per session
//!
//! ### Output
//! - [`AudioOutputDevice`](output::AudioOutputDevice) - Opens a hardware output path
//! - [`RenderCallback`](output::RenderCallback) - Real-time pull callback owned by the renderer
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ File, HTTP, cpal output |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it with an actionable message.
//!
//! ## Thread Safety
//!
//! Transports, output devices and factories are shared across tasks and must
//! be `Send + Sync`. Codecs and output streams are owned by one worker and only
//! need `Send`.

pub mod codec;
pub mod error;
pub mod output;
pub mod platform;
pub mod playback;
pub mod time;
pub mod transport;

pub use error::BridgeError;

// Re-export commonly used types
pub use codec::{
    seek_point_by_bitrate, CodecFactory, ContainerHeader, FrameCodec, FrameOutcome, HeaderStatus,
    SeekPoint,
};
pub use output::{AudioOutputDevice, OutputStream, RenderCallback};
pub use playback::{AudioCodec, AudioSource, PcmFormat, TransportStatus};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
pub use transport::{AudioTransport, CacheStore, CacheWriter, TransportResponse, TransportSink};
