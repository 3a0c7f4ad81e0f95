//! # Format Parser
//!
//! Resolves the container header of a stream from the bytes acquired so far.
//!
//! The parser is re-run lazily whenever new bytes arrive while it is still
//! `NotReady`. Every registered codec gets to inspect the same head of the
//! buffer; the first one that recognises it wins and is handed over to the
//! frame decoder. Probing never mutates the acquisition buffer, so a parse
//! attempt on a partial header can simply be repeated later.

use crate::acquisition::{AcquisitionState, AcquisitionTracker};
use crate::decoder::format_detector::{FormatDetector, FormatHint};
use bridge_traits::{
    AudioCodec, CodecFactory, ContainerHeader, FrameCodec, HeaderStatus, PcmFormat,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolution state of the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// The header has not been fully seen yet.
    NotReady,
    /// A codec recognised the header.
    Available,
    /// No codec recognises the stream, or its header is corrupt or truncated.
    Unavailable,
}

/// Description of the stream shared read-only with the decoder and session.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescription {
    /// Header as parsed by the codec.
    pub header: ContainerHeader,
    /// Canonical layout the decoder emits.
    pub output_format: PcmFormat,
    /// Duration estimate at the moment the header was parsed, in seconds.
    pub estimated_duration: f64,
    /// Name of the codec that recognised the stream.
    pub codec_name: &'static str,
}

impl FormatDescription {
    pub fn codec(&self) -> &AudioCodec {
        &self.header.codec
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.header.channels
    }

    pub fn data_offset(&self) -> u64 {
        self.header.data_offset
    }

    /// Absolute offset one past the last coded byte, when the container
    /// declares the data length.
    pub fn data_end(&self) -> Option<u64> {
        self.header
            .data_length
            .map(|len| self.header.data_offset + len)
    }
}

struct Candidate {
    factory: Arc<dyn CodecFactory>,
    codec: Box<dyn FrameCodec>,
}

/// Incremental header parser over the acquisition buffer.
pub struct FormatParser {
    factories: Vec<Arc<dyn CodecFactory>>,
    hint: FormatHint,
    max_header_bytes: usize,
    state: ParserState,
    candidates: Option<Vec<Candidate>>,
    rejections: Vec<String>,
    description: Option<Arc<FormatDescription>>,
    codec: Option<Box<dyn FrameCodec>>,
    failure: Option<String>,
    duration: f64,
    duration_is_final: bool,
}

impl FormatParser {
    /// Create a parser that tries `factories` in hint order.
    pub fn new(
        factories: Vec<Arc<dyn CodecFactory>>,
        hint: FormatHint,
        max_header_bytes: usize,
    ) -> Self {
        Self {
            factories,
            hint,
            max_header_bytes,
            state: ParserState::NotReady,
            candidates: None,
            rejections: Vec::new(),
            description: None,
            codec: None,
            failure: None,
            duration: 0.0,
            duration_is_final: false,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Parsed description, once `Available`.
    pub fn description(&self) -> Option<Arc<FormatDescription>> {
        self.description.clone()
    }

    /// Why the parser became `Unavailable`.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Current duration estimate in seconds and whether it is final.
    pub fn duration(&self) -> (f64, bool) {
        (self.duration, self.duration_is_final)
    }

    /// Hand the primed codec to the frame decoder. Returns `None` after the
    /// first call or while not `Available`.
    pub fn take_codec(&mut self) -> Option<Box<dyn FrameCodec>> {
        self.codec.take()
    }

    /// Try to resolve the header from the bytes `tracker` holds.
    pub fn parse(&mut self, tracker: &AcquisitionTracker) -> ParserState {
        if self.state != ParserState::NotReady {
            return self.state;
        }

        let acquisition = tracker.state();
        let head_len = (acquisition.received_length as usize).min(self.max_header_bytes);
        if head_len == 0 {
            if acquisition.finished {
                self.resolve_unavailable("stream is empty".to_string());
            }
            return self.state;
        }

        let head = tracker.read_bytes(0, head_len);
        let total_length = tracker.expected_length();

        if self.candidates.is_none() {
            let mut hint = self.hint.clone();
            if hint.mime_type.is_none() {
                hint = FormatHint::new(hint.extension, acquisition.mime_type.clone());
            }
            let ordered = FormatDetector::order_factories(&self.factories, &hint, &head);
            self.candidates = Some(
                ordered
                    .into_iter()
                    .map(|factory| {
                        let codec = factory.create();
                        Candidate { factory, codec }
                    })
                    .collect(),
            );
        }

        let Some(mut candidates) = self.candidates.take() else {
            return self.state;
        };

        let mut parsed: Option<(Candidate, ContainerHeader)> = None;
        let mut remaining = Vec::with_capacity(candidates.len());
        for mut candidate in candidates.drain(..) {
            if parsed.is_some() {
                break;
            }
            match candidate.codec.parse_header(&head, total_length) {
                HeaderStatus::Parsed(header) => parsed = Some((candidate, header)),
                HeaderStatus::Incomplete => remaining.push(candidate),
                HeaderStatus::Unrecognized(reason) => {
                    debug!(
                        codec = candidate.codec.name(),
                        reason = %reason,
                        "Codec rejected stream"
                    );
                    self.rejections
                        .push(format!("{}: {}", candidate.codec.name(), reason));
                }
            }
        }

        if let Some((candidate, header)) = parsed {
            self.resolve_available(candidate, header, &acquisition);
            return self.state;
        }

        if remaining.is_empty() {
            let reason = if self.rejections.is_empty() {
                "no codec registered".to_string()
            } else {
                format!("unrecognised stream ({})", self.rejections.join("; "))
            };
            self.resolve_unavailable(reason);
        } else if acquisition.finished && head_len as u64 >= acquisition.received_length {
            self.resolve_unavailable(format!(
                "stream ended after {head_len} bytes with an incomplete header"
            ));
        } else if head_len >= self.max_header_bytes {
            self.resolve_unavailable(format!(
                "no complete header within the first {} bytes",
                self.max_header_bytes
            ));
        } else {
            self.candidates = Some(remaining);
        }

        self.state
    }

    /// Revise the duration estimate from the latest acquisition counters.
    ///
    /// Returns the new `(duration, is_final)` when it changed.
    pub fn refresh_duration(&mut self, acquisition: &AcquisitionState) -> Option<(f64, bool)> {
        let description = self.description.as_ref()?;
        if self.duration_is_final {
            return None;
        }

        let (duration, is_final) = estimate_duration(&description.header, acquisition);
        if (duration - self.duration).abs() < 1e-9 && is_final == self.duration_is_final {
            return None;
        }

        self.duration = duration;
        self.duration_is_final = is_final;
        Some((duration, is_final))
    }

    fn resolve_available(
        &mut self,
        mut candidate: Candidate,
        header: ContainerHeader,
        acquisition: &AcquisitionState,
    ) {
        if let Err(err) = candidate.codec.prime(&header) {
            self.resolve_unavailable(format!("{} rejected its header: {err}", candidate.codec.name()));
            return;
        }

        let (duration, is_final) = estimate_duration(&header, acquisition);
        let description = FormatDescription {
            output_format: candidate.codec.output_format(&header),
            estimated_duration: duration,
            codec_name: candidate.codec.name(),
            header,
        };

        info!(
            codec = description.codec_name,
            factory = ?candidate.factory.codec(),
            sample_rate = description.sample_rate(),
            channels = description.channels(),
            data_offset = description.data_offset(),
            duration,
            "Format available"
        );

        self.duration = duration;
        self.duration_is_final = is_final;
        self.description = Some(Arc::new(description));
        self.codec = Some(candidate.codec);
        self.state = ParserState::Available;
    }

    fn resolve_unavailable(&mut self, reason: String) {
        warn!(reason = %reason, "Format unavailable");
        self.failure = Some(reason);
        self.state = ParserState::Unavailable;
        self.candidates = None;
    }
}

/// Exact when the container declares it, otherwise derived from the data
/// length (or the bytes still expected) and the average bitrate.
fn estimate_duration(header: &ContainerHeader, acquisition: &AcquisitionState) -> (f64, bool) {
    if let Some(exact) = header.exact_duration {
        return (exact, true);
    }

    let Some(bitrate) = header.bitrate.filter(|rate| *rate > 0) else {
        return (0.0, acquisition.finished);
    };

    let total = if acquisition.finished {
        acquisition.received_length
    } else {
        acquisition.expected_length
    };
    let available = total.saturating_sub(header.data_offset);
    let coded = match header.data_length {
        Some(len) if acquisition.finished => len.min(available),
        Some(len) => len,
        None => available,
    };

    (coded as f64 * 8.0 / bitrate as f64, acquisition.finished)
}

impl std::fmt::Debug for FormatParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatParser")
            .field("state", &self.state)
            .field("description", &self.description)
            .field("failure", &self.failure)
            .finish()
    }
}
