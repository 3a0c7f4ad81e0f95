//! # Symphonia Frame Codec
//!
//! [`FrameCodec`] backed by Symphonia. Symphonia recognises the container
//! header from whatever prefix of the stream has arrived, and every [`FrameCodec::decode_frame`] call hands exactly one coded packet
//! to a Symphonia [`Decoder`].
//!
//! The decode worker reads coded bytes straight out of the acquisition buffer
//! through a byte cursor, so packet boundaries are located here instead of by
//! a Symphonia format reader:
//!
//! | Family | Packet |
//! |--------|--------|
//! | WAVE LPCM | a run of whole sample frames |
//! | MPEG audio (Layer I/II/III) | one frame, header included |
//! | ADTS AAC | one frame, ADTS header stripped |
//!
//! Containers whose packets can only be found through a seekable demuxer
//! (FLAC, Ogg, MP4) are rejected while the header is read.

use super::format_detector::FormatDetector;
use super::sample_converter::SampleConverter;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{
    seek_point_by_bitrate, AudioCodec, CodecFactory, ContainerHeader, FrameCodec, FrameOutcome,
    HeaderStatus, SeekPoint,
};
use bytes::Bytes;
use std::io::{Cursor, ErrorKind, Read, Seek, SeekFrom};
use std::sync::Arc;
use symphonia::core::audio::{Layout, SampleBuffer};
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, Packet};
use symphonia::core::io::{MediaSource, MediaSourceStream, ReadBytes};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, error, warn};

/// Packets in a row the decoder may reject before the stream counts as corrupt.
const MAX_CONSECUTIVE_ERRORS: usize = 10;

/// Largest LPCM packet handed to the decoder, in sample frames.
const MAX_PCM_FRAMES: usize = 1_152;

/// Heads at least this long that open with no known signature are rejected.
const MIN_HEADER_BYTES: usize = 12;

/// Largest MPEG audio frame (Layer II, 160 kbit/s at 8 kHz, padded).
const MAX_MPEG_FRAME_BYTES: usize = 2_881;

/// Largest ADTS frame the 13-bit length field can express.
const MAX_ADTS_FRAME_BYTES: usize = 8_191;

const MPEG_HEADER_BYTES: usize = 4;
const ADTS_HEADER_BYTES: usize = 7;

/// Bitrates in kbit/s, indexed by the header's bitrate field.
const MPEG1_LAYER1_KBPS: [u16; 15] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448];
const MPEG1_LAYER2_KBPS: [u16; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384];
const MPEG1_LAYER3_KBPS: [u16; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const MPEG2_LAYER1_KBPS: [u16; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256];
const MPEG2_LAYER23_KBPS: [u16; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

const MPEG1_SAMPLE_RATES: [u32; 3] = [44_100, 48_000, 32_000];

const ADTS_SAMPLE_RATES: [u32; 13] = [
    96_000, 88_200, 64_000, 48_000, 44_100, 32_000, 24_000, 22_050, 16_000, 12_000, 11_025, 8_000,
    7_350,
];

/// How coded packets are delimited in the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Pcm { block_align: usize, max_frames: usize },
    Mpeg,
    Adts,
}

impl Framing {
    fn max_packet_bytes(self) -> usize {
        match self {
            Framing::Pcm {
                block_align,
                max_frames,
            } => block_align * max_frames,
            // Room for the next header so resync can confirm a boundary.
            Framing::Mpeg => MAX_MPEG_FRAME_BYTES + MPEG_HEADER_BYTES,
            Framing::Adts => MAX_ADTS_FRAME_BYTES,
        }
    }

    fn header_bytes(self) -> usize {
        match self {
            Framing::Pcm { .. } => 0,
            Framing::Mpeg => MPEG_HEADER_BYTES,
            Framing::Adts => ADTS_HEADER_BYTES,
        }
    }

    fn is_header(self, bytes: &[u8]) -> bool {
        match self {
            Framing::Pcm { .. } => true,
            Framing::Mpeg => MpegFrame::parse(bytes).is_some(),
            Framing::Adts => AdtsFrame::parse(bytes).is_some(),
        }
    }

    /// Byte range of the packet payload and the bytes the packet occupies.
    fn locate(self, data: &[u8], at_end: bool) -> Span {
        match self {
            Framing::Pcm {
                block_align,
                max_frames,
            } => {
                let whole = data.len() / block_align;
                if whole >= max_frames {
                    Span::Packet {
                        payload: 0..max_frames * block_align,
                        length: max_frames * block_align,
                    }
                } else if at_end && whole > 0 {
                    Span::Packet {
                        payload: 0..whole * block_align,
                        length: whole * block_align,
                    }
                } else if at_end {
                    Span::End
                } else {
                    Span::Wait
                }
            }
            Framing::Mpeg => match MpegFrame::parse(data) {
                Some(frame) => Span::whole_frame(data, 0, frame.length, at_end),
                None => self.resync(data, at_end),
            },
            Framing::Adts => match AdtsFrame::parse(data) {
                Some(frame) => Span::whole_frame(data, frame.header_len, frame.length, at_end),
                None => self.resync(data, at_end),
            },
        }
    }

    /// Skip to the next plausible frame header.
    fn resync(self, data: &[u8], at_end: bool) -> Span {
        let header = self.header_bytes();
        if data.len() < header {
            return if at_end { Span::End } else { Span::Wait };
        }

        let found = (1..data.len())
            .find(|&offset| data[offset] == 0xFF && self.is_header(&data[offset..]));
        match found {
            Some(offset) => Span::Skip(offset),
            // Trailing tags (ID3v1, APE) hold no sync word.
            None if at_end => Span::End,
            // Keep a possible header split across the window edge.
            None => Span::Skip(data.len() + 1 - header),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Span {
    Packet {
        payload: std::ops::Range<usize>,
        length: usize,
    },
    Skip(usize),
    Wait,
    End,
}

impl Span {
    fn whole_frame(data: &[u8], header_len: usize, length: usize, at_end: bool) -> Span {
        if data.len() >= length {
            Span::Packet {
                payload: header_len..length,
                length,
            }
        } else if at_end {
            // A truncated final frame cannot be decoded.
            Span::End
        } else {
            Span::Wait
        }
    }
}

/// Fields of one MPEG audio frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MpegFrame {
    length: usize,
    bitrate: u32,
}

impl MpegFrame {
    fn parse(header: &[u8]) -> Option<Self> {
        if header.len() < MPEG_HEADER_BYTES || header[0] != 0xFF || header[1] & 0xE0 != 0xE0 {
            return None;
        }

        // Version: 0 = 2.5, 1 = reserved, 2 = 2, 3 = 1. Layer: 1 = III, 2 = II, 3 = I.
        let version = (header[1] >> 3) & 0x03;
        let layer = (header[1] >> 1) & 0x03;
        let bitrate_index = (header[2] >> 4) as usize;
        let rate_index = ((header[2] >> 2) & 0x03) as usize;
        let padding = ((header[2] >> 1) & 0x01) as u32;

        // Free-format streams carry no frame length.
        if version == 1 || layer == 0 || bitrate_index == 0 || bitrate_index == 15 || rate_index == 3
        {
            return None;
        }

        let mpeg1 = version == 3;
        let table = match (mpeg1, layer) {
            (true, 3) => &MPEG1_LAYER1_KBPS,
            (true, 2) => &MPEG1_LAYER2_KBPS,
            (true, _) => &MPEG1_LAYER3_KBPS,
            (false, 3) => &MPEG2_LAYER1_KBPS,
            (false, _) => &MPEG2_LAYER23_KBPS,
        };
        let bitrate = table[bitrate_index] as u32 * 1_000;
        let sample_rate = match version {
            3 => MPEG1_SAMPLE_RATES[rate_index],
            2 => MPEG1_SAMPLE_RATES[rate_index] / 2,
            _ => MPEG1_SAMPLE_RATES[rate_index] / 4,
        };

        let length = match layer {
            3 => (12 * bitrate / sample_rate + padding) * 4,
            2 => 144 * bitrate / sample_rate + padding,
            _ if mpeg1 => 144 * bitrate / sample_rate + padding,
            _ => 72 * bitrate / sample_rate + padding,
        };

        Some(Self {
            length: length as usize,
            bitrate,
        })
    }
}

/// Fields of one ADTS frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AdtsFrame {
    length: usize,
    header_len: usize,
    sample_rate: u32,
    channel_config: u8,
    samples: u32,
}

impl AdtsFrame {
    fn parse(header: &[u8]) -> Option<Self> {
        if header.len() < ADTS_HEADER_BYTES || header[0] != 0xFF || header[1] & 0xF6 != 0xF0 {
            return None;
        }

        // A CRC follows the fixed header unless protection is absent.
        let header_len = if header[1] & 0x01 == 1 { 7 } else { 9 };
        let sample_rate = *ADTS_SAMPLE_RATES.get(((header[2] >> 2) & 0x0F) as usize)?;
        let channel_config = ((header[2] & 0x01) << 2) | (header[3] >> 6);
        let length = (((header[3] & 0x03) as usize) << 11)
            | ((header[4] as usize) << 3)
            | ((header[5] as usize) >> 5);
        if length <= header_len {
            return None;
        }

        Some(Self {
            length,
            header_len,
            sample_rate,
            channel_config,
            samples: 1_024 * ((header[6] & 0x03) as u32 + 1),
        })
    }
}

/// The arrived prefix of a stream, presented to Symphonia as a stream of
/// unknown length so nothing is derived from how much happened to arrive.
struct HeadSource(Cursor<Vec<u8>>);

impl Read for HeadSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl Seek for HeadSource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.0.seek(pos)
    }
}

impl MediaSource for HeadSource {
    fn is_seekable(&self) -> bool {
        false
    }

    fn byte_len(&self) -> Option<u64> {
        None
    }
}

/// What recognition learned about the stream.
struct Recognised {
    params: CodecParameters,
    framing: Framing,
}

/// Symphonia-backed codec for one family of streams.
pub struct SymphoniaCodec {
    family: AudioCodec,
    recognised: Option<Recognised>,
    decoder: Option<Box<dyn Decoder>>,
    samples: Option<SampleBuffer<i16>>,
    next_ts: u64,
    consecutive_errors: usize,
}

impl SymphoniaCodec {
    pub fn new(family: AudioCodec) -> Self {
        Self {
            family,
            recognised: None,
            decoder: None,
            samples: None,
            next_ts: 0,
            consecutive_errors: 0,
        }
    }

    fn hint(&self) -> Hint {
        let mut hint = Hint::new();
        match self.family {
            AudioCodec::Aac => hint.with_extension("aac"),
            ref family => hint.with_extension(FormatDetector::codec_extension(family)),
        };
        hint
    }

    /// Run Symphonia format recognition over `head`.
    ///
    /// Returns the parameters of the first audio track and the offset the
    /// format reader stopped at, which is the first coded packet.
    fn recognise(&self, head: &[u8]) -> std::result::Result<(CodecParameters, u64), SymphoniaError> {
        let source = MediaSourceStream::new(
            Box::new(HeadSource(Cursor::new(head.to_vec()))),
            Default::default(),
        );
        let recognised = symphonia::default::get_probe().format(
            &self.hint(),
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let params = recognised
            .format
            .tracks()
            .iter()
            .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .map(|track| track.codec_params.clone())
            .ok_or(SymphoniaError::Unsupported("no audio track found"))?;
        let data_offset = recognised.format.into_inner().pos();
        Ok((params, data_offset))
    }

    /// Build the container header from recognised parameters.
    fn header_from(
        &self,
        mut params: CodecParameters,
        mut data_offset: u64,
        head: &[u8],
        total_length: Option<u64>,
    ) -> std::result::Result<Option<(ContainerHeader, Recognised)>, String> {
        let family = FormatDetector::detect_codec(params.codec);
        if family != self.family {
            return Err(format!("stream carries {family:?}"));
        }

        let sample_rate = params
            .sample_rate
            .filter(|rate| *rate > 0)
            .ok_or("stream declares no sample rate")?;
        let available = total_length.map(|total| total.saturating_sub(data_offset));

        let (framing, data_length, exact_duration, bitrate) = if family == AudioCodec::Wav {
            let channels = params.channels.map(|c| c.count()).unwrap_or(0);
            let sample_bytes = params
                .bits_per_coded_sample
                .or(params.bits_per_sample)
                .map(|bits| (bits as usize).div_ceil(8))
                .unwrap_or(0);
            if channels == 0 || sample_bytes == 0 {
                return Err("WAVE header declares no channels or no sample width".to_string());
            }

            let block_align = channels * sample_bytes;
            let max_frames = params
                .max_frames_per_packet
                .map_or(MAX_PCM_FRAMES, |frames| (frames as usize).clamp(1, MAX_PCM_FRAMES));
            params.with_max_frames_per_packet(max_frames as u64);

            // Streaming writers leave the size at zero or at its maximum.
            let declared = params
                .n_frames
                .filter(|frames| *frames > 0)
                .map(|frames| frames * block_align as u64);
            let whole = |len: u64| len - len % block_align as u64;
            let (data_length, exact) = match (declared, available) {
                (Some(declared), Some(available)) if declared > available => {
                    (Some(whole(available)), None)
                }
                (Some(declared), _) => (
                    Some(declared),
                    Some(declared as f64 / (block_align as f64 * sample_rate as f64)),
                ),
                (None, available) => (available.map(whole), None),
            };

            (
                Framing::Pcm {
                    block_align,
                    max_frames,
                },
                data_length,
                exact,
                Some(sample_rate.saturating_mul(block_align as u32 * 8)),
            )
        } else {
            let framing = match family {
                AudioCodec::Mp3 => Framing::Mpeg,
                AudioCodec::Aac => Framing::Adts,
                other => return Err(format!("{other:?} packets cannot be delimited in a byte stream")),
            };

            // The reader normally stops on a frame; step over anything else.
            let start = data_offset as usize;
            let Some(skip) = head
                .get(start..)
                .and_then(|rest| (0..rest.len()).find(|&i| framing.is_header(&rest[i..])))
            else {
                return Ok(None);
            };
            data_offset += skip as u64;
            let first = &head[start + skip..];

            let bitrate = match framing {
                Framing::Mpeg => MpegFrame::parse(first).map(|frame| frame.bitrate),
                _ => AdtsFrame::parse(first).map(|frame| {
                    // One frame's share of the stream stands in for the average.
                    (frame.length as u64 * 8 * frame.sample_rate as u64 / frame.samples as u64) as u32
                }),
            };

            if params.channels.is_none() {
                let layout = match AdtsFrame::parse(first).map(|frame| frame.channel_config) {
                    Some(1) => Layout::Mono,
                    Some(2) => Layout::Stereo,
                    _ => return Err("stream declares no channel layout".to_string()),
                };
                params.with_channels(layout.into_channels());
            }

            let exact = params
                .n_frames
                .filter(|frames| *frames > 0)
                .map(|frames| frames as f64 / sample_rate as f64);
            (
                framing,
                total_length.map(|total| total.saturating_sub(data_offset)),
                exact,
                bitrate,
            )
        };

        let channels = params.channels.map(|c| c.count()).unwrap_or(0) as u16;
        let header = ContainerHeader {
            codec: family,
            sample_rate,
            channels,
            bits_per_sample: params.bits_per_sample.map(|bits| bits as u16),
            data_offset,
            data_length,
            exact_duration,
            bitrate,
            max_frame_bytes: framing.max_packet_bytes(),
            cookie: params.extra_data.as_deref().map(Bytes::copy_from_slice),
        };
        Ok(Some((header, Recognised { params, framing })))
    }
}

impl FrameCodec for SymphoniaCodec {
    fn name(&self) -> &'static str {
        match self.family {
            AudioCodec::Wav => "wav",
            AudioCodec::Mp3 => "mpeg-audio",
            AudioCodec::Aac => "adts-aac",
            _ => "symphonia",
        }
    }

    fn parse_header(&mut self, head: &[u8], total_length: Option<u64>) -> HeaderStatus {
        let whole_stream = total_length.is_some_and(|total| head.len() as u64 >= total);

        // Only streams that open with a known signature reach Symphonia.
        if FormatDetector::sniff(head).is_none() {
            return if head.len() < MIN_HEADER_BYTES && !whole_stream {
                HeaderStatus::Incomplete
            } else {
                HeaderStatus::Unrecognized("no known container signature".to_string())
            };
        }

        let (params, data_offset) = match self.recognise(head) {
            Ok(found) => found,
            Err(SymphoniaError::IoError(err))
                if err.kind() == ErrorKind::UnexpectedEof && !whole_stream =>
            {
                return HeaderStatus::Incomplete;
            }
            Err(err) => return HeaderStatus::Unrecognized(err.to_string()),
        };

        match self.header_from(params, data_offset, head, total_length) {
            Ok(Some((header, recognised))) => {
                debug!(
                    codec = self.name(),
                    data_offset = header.data_offset,
                    framing = ?recognised.framing,
                    "Stream header recognised"
                );
                self.recognised = Some(recognised);
                HeaderStatus::Parsed(header)
            }
            Ok(None) if !whole_stream => HeaderStatus::Incomplete,
            Ok(None) => HeaderStatus::Unrecognized("no frame follows the header".to_string()),
            Err(reason) => HeaderStatus::Unrecognized(reason),
        }
    }

    fn prime(&mut self, _header: &ContainerHeader) -> Result<()> {
        let Some(recognised) = self.recognised.as_ref() else {
            return Err(BridgeError::OperationFailed(
                "codec primed before its header was recognised".to_string(),
            ));
        };

        let decoder = symphonia::default::get_codecs()
            .make(&recognised.params, &DecoderOptions::default())
            .map_err(|e| BridgeError::OperationFailed(format!("failed to create decoder: {e}")))?;

        self.decoder = Some(decoder);
        self.samples = None;
        self.next_ts = 0;
        self.consecutive_errors = 0;
        Ok(())
    }

    fn decode_frame(&mut self, data: &[u8], at_end: bool, out: &mut Vec<u8>) -> FrameOutcome {
        let Some(framing) = self.recognised.as_ref().map(|recognised| recognised.framing) else {
            return FrameOutcome::Corrupt("codec used before prime".to_string());
        };
        let Some(decoder) = self.decoder.as_mut() else {
            return FrameOutcome::Corrupt("codec used before prime".to_string());
        };

        let (payload, length) = match framing.locate(data, at_end) {
            Span::Packet { payload, length } => (payload, length),
            Span::Skip(skip) => {
                debug!(skip, "Skipping bytes without a frame header");
                return FrameOutcome::Decoded {
                    consumed: skip,
                    frames: 0,
                };
            }
            Span::Wait => return FrameOutcome::Incomplete,
            Span::End => return FrameOutcome::EndOfStream,
        };

        let packet = Packet::new_from_slice(0, self.next_ts, 0, &data[payload]);
        let reason = match decoder.decode(&packet) {
            Ok(decoded) => {
                self.consecutive_errors = 0;
                let spec = *decoded.spec();
                let channels = spec.channels.count();
                let frames = decoded.frames();
                if frames == 0 {
                    return FrameOutcome::Decoded {
                        consumed: length,
                        frames: 0,
                    };
                }

                let needed = decoded.capacity() * channels;
                let mut buffer = match self.samples.take() {
                    Some(buffer) if buffer.capacity() >= needed => buffer,
                    _ => SampleBuffer::<i16>::new(decoded.capacity() as u64, spec),
                };
                buffer.copy_interleaved_ref(decoded);
                let written = SampleConverter::interleaved_to_standard(buffer.samples(), channels, out);
                self.samples = Some(buffer);
                self.next_ts += frames as u64;

                return FrameOutcome::Decoded {
                    consumed: length,
                    frames: written as u64,
                };
            }
            Err(SymphoniaError::DecodeError(reason)) => reason.to_string(),
            Err(SymphoniaError::IoError(err)) => err.to_string(),
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                "decoder reset required".to_string()
            }
            Err(err) => {
                error!("Fatal decode error: {}", err);
                return FrameOutcome::Corrupt(format!("failed to decode packet: {err}"));
            }
        };

        // Skip the damaged packet and carry on with the next one.
        self.consecutive_errors += 1;
        warn!(
            "Skipping packet with decode error (attempt {}/{}): {}",
            self.consecutive_errors, MAX_CONSECUTIVE_ERRORS, reason
        );
        if self.consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
            return FrameOutcome::Corrupt(format!(
                "decoder failure after {MAX_CONSECUTIVE_ERRORS} failed packets: {reason}"
            ));
        }
        FrameOutcome::Decoded {
            consumed: length,
            frames: 0,
        }
    }

    fn seek_point(&self, header: &ContainerHeader, seconds: f64) -> SeekPoint {
        let Some(Framing::Pcm { block_align, .. }) = self.recognised.as_ref().map(|p| p.framing) else {
            return seek_point_by_bitrate(header, seconds);
        };

        let mut frame = (seconds.max(0.0) * header.sample_rate as f64).round() as u64;
        if let Some(len) = header.data_length {
            frame = frame.min(len / block_align as u64);
        }
        SeekPoint {
            byte_offset: header.data_offset + frame * block_align as u64,
            time: frame as f64 / header.sample_rate as f64,
        }
    }

    fn reset(&mut self) {
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.reset();
        }
        self.consecutive_errors = 0;
    }
}

/// Factory registering [`SymphoniaCodec`] for one family of streams.
#[derive(Debug, Clone)]
pub struct SymphoniaCodecFactory {
    family: AudioCodec,
}

impl SymphoniaCodecFactory {
    pub fn new(family: AudioCodec) -> Self {
        Self { family }
    }

    /// Factories for every family that can be decoded from a byte stream.
    pub fn defaults() -> Vec<Arc<dyn CodecFactory>> {
        [AudioCodec::Wav, AudioCodec::Mp3, AudioCodec::Aac]
            .into_iter()
            .map(|family| Arc::new(Self::new(family)) as Arc<dyn CodecFactory>)
            .collect()
    }
}

impl CodecFactory for SymphoniaCodecFactory {
    fn codec(&self) -> AudioCodec {
        self.family.clone()
    }

    fn handles_extension(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        match self.family {
            AudioCodec::Wav => matches!(extension.as_str(), "wav" | "wave"),
            AudioCodec::Mp3 => matches!(extension.as_str(), "mp3" | "mp2" | "mp1" | "mpga"),
            AudioCodec::Aac => matches!(extension.as_str(), "aac" | "adts"),
            ref family => extension == FormatDetector::codec_extension(family),
        }
    }

    fn handles_mime_type(&self, mime_type: &str) -> bool {
        let mime_type = mime_type.to_ascii_lowercase();
        match self.family {
            AudioCodec::Wav => matches!(
                mime_type.as_str(),
                "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave"
            ),
            AudioCodec::Mp3 => matches!(mime_type.as_str(), "audio/mpeg" | "audio/mp3" | "audio/mpa"),
            AudioCodec::Aac => matches!(mime_type.as_str(), "audio/aac" | "audio/aacp" | "audio/x-aac"),
            ref family => mime_type == FormatDetector::codec_mime_type(family),
        }
    }

    fn create(&self) -> Box<dyn FrameCodec> {
        debug!(family = ?self.family, "Creating Symphonia codec");
        Box::new(SymphoniaCodec::new(self.family.clone()))
    }
}
