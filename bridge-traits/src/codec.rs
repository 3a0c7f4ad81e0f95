//! Container demux and frame decode contracts.
//!
//! The playback core never interprets container or codec bitstreams itself.
//! It hands byte windows from the acquisition buffer to a [`FrameCodec`] and
//! receives either a parsed header, one decoded frame of canonical PCM, or a
//! request for more bytes.

use crate::error::Result;
use crate::platform::{PlatformSend, PlatformSendSync};
use crate::playback::{AudioCodec, PcmFormat};
use bytes::Bytes;

/// Header information a codec extracts from the start of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerHeader {
    /// Codec carried by the container.
    pub codec: AudioCodec,
    /// Source sample rate in hertz.
    pub sample_rate: u32,
    /// Source channel count.
    pub channels: u16,
    /// Source bits per sample, when meaningful.
    pub bits_per_sample: Option<u16>,
    /// Absolute byte offset of the first coded frame.
    pub data_offset: u64,
    /// Length in bytes of the coded data region, when declared by the container.
    pub data_length: Option<u64>,
    /// Exact duration in seconds, when the container declares a frame count.
    pub exact_duration: Option<f64>,
    /// Average bitrate of the coded data in bits per second.
    pub bitrate: Option<u32>,
    /// Upper bound on the size of one coded frame in bytes.
    pub max_frame_bytes: usize,
    /// Opaque codec initialisation data ("magic cookie").
    pub cookie: Option<Bytes>,
}

/// Outcome of one header parse attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderStatus {
    /// More bytes are required before the header can be judged.
    Incomplete,
    /// The header was recognised.
    Parsed(ContainerHeader),
    /// The bytes are not this container, or the header is corrupt.
    Unrecognized(String),
}

/// Outcome of one frame decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// One frame decoded. `consumed` coded bytes were read and `frames`
    /// PCM frames were appended to the output buffer.
    Decoded { consumed: usize, frames: u64 },
    /// The window holds less than one whole frame.
    Incomplete,
    /// No coded data remains in the window and none will follow.
    EndOfStream,
    /// The frame is corrupt and decoding cannot continue.
    Corrupt(String),
}

/// Frame boundary chosen for a seek.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekPoint {
    /// Absolute byte offset of the frame boundary.
    pub byte_offset: u64,
    /// Presentation time of that frame in seconds.
    pub time: f64,
}

/// Codec collaborator.
///
/// Implementations are stateful (decoder history, cookie) and are owned by a
/// single decode worker; they are not shared across threads.
pub trait FrameCodec: PlatformSend {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Try to parse the container header from the first bytes of the stream.
    ///
    /// `total_length` is the expected stream length, when the transport knows
    /// it. Must be idempotent: probing the same bytes twice yields the same
    /// answer and never corrupts codec state.
    fn parse_header(&mut self, head: &[u8], total_length: Option<u64>) -> HeaderStatus;

    /// PCM layout that [`FrameCodec::decode_frame`] emits for `header`.
    fn output_format(&self, header: &ContainerHeader) -> PcmFormat {
        PcmFormat::standard(header.sample_rate)
    }

    /// Prepare the decoder for `header` (apply cookie, allocate state).
    fn prime(&mut self, header: &ContainerHeader) -> Result<()>;

    /// Decode the frame starting at the beginning of `data`.
    ///
    /// `at_end` is `true` when `data` reaches the final byte of the stream and
    /// no more bytes will ever follow, which allows a short trailing frame to
    /// be decoded. Decoded PCM is appended to `out` in the output format.
    fn decode_frame(&mut self, data: &[u8], at_end: bool, out: &mut Vec<u8>) -> FrameOutcome;

    /// Frame boundary nearest `seconds`.
    ///
    /// The default maps time linearly through the average bitrate, which is
    /// what constant-bitrate containers need; codecs with a frame index should
    /// override it.
    fn seek_point(&self, header: &ContainerHeader, seconds: f64) -> SeekPoint {
        seek_point_by_bitrate(header, seconds)
    }

    /// Drop decoder history after the read position jumped.
    fn reset(&mut self) {}
}

/// Map `seconds` to a byte offset through the average bitrate of `header`.
///
/// Without a bitrate the first coded frame is returned.
pub fn seek_point_by_bitrate(header: &ContainerHeader, seconds: f64) -> SeekPoint {
    match header.bitrate {
        Some(bitrate) if bitrate > 0 => {
            let offset = (seconds.max(0.0) * bitrate as f64 / 8.0) as u64;
            let offset = match header.data_length {
                Some(len) => offset.min(len),
                None => offset,
            };
            SeekPoint {
                byte_offset: header.data_offset + offset,
                time: offset as f64 * 8.0 / bitrate as f64,
            }
        }
        _ => SeekPoint {
            byte_offset: header.data_offset,
            time: 0.0,
        },
    }
}

/// Constructs fresh codec instances for new sessions.
pub trait CodecFactory: PlatformSendSync {
    /// Codec produced by this factory.
    fn codec(&self) -> AudioCodec;

    /// Returns `true` if the factory handles files with `extension`.
    fn handles_extension(&self, extension: &str) -> bool;

    /// Returns `true` if the factory handles the MIME type `mime_type`.
    fn handles_mime_type(&self, mime_type: &str) -> bool;

    /// Create a new codec instance.
    fn create(&self) -> Box<dyn FrameCodec>;
}
