//! # Playback & Streaming Module
//!
//! Streaming audio playback: bytes arrive incrementally from a host transport
//! and play while the transfer is still running.
//!
//! ## Overview
//!
//! ```text
//! AudioTransport ─▶ AcquisitionTracker ─▶ FormatParser ─▶ FrameDecoder
//!                                                            │
//!                      OutputDevice ◀─ Renderer ◀─ PcmQueue ◀┘
//! ```
//!
//! - [`acquisition`] accumulates bytes and download statistics
//! - [`parser`] identifies the container and its stream format
//! - [`decoder`] turns coded frames into canonical 16-bit stereo PCM
//! - [`pcm_queue`] holds decoded PCM between the decoder and the renderer
//! - [`renderer`] feeds the output device and keeps the playback clock
//! - [`session`] runs the transport state machine for one source
//! - [`event_loop`] owns the current session and exposes host commands

pub mod acquisition;
pub mod config;
pub mod decoder;
pub mod error;
pub mod event_loop;
pub mod parser;
pub mod pcm_queue;
pub mod renderer;
pub mod ring_buffer;
pub mod session;

pub use acquisition::{AcquisitionState, AcquisitionTracker};
pub use config::StreamerConfig;
pub use decoder::{
    DecodeCursor, DecodeStatus, FormatDetector, FormatHint, FrameDecoder, SampleConverter,
    SymphoniaCodec, SymphoniaCodecFactory,
};
pub use error::{FailureKind, PlaybackError, Result, SessionFailure};
pub use event_loop::EventLoop;
pub use parser::{FormatDescription, FormatParser, ParserState};
pub use pcm_queue::{PcmChunk, PcmQueue, QueueRead};
pub use renderer::{Renderer, RendererState};
pub use ring_buffer::RingBuffer;
pub use session::{PlaybackSession, PlaybackSnapshot};
