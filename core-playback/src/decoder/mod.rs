//! # Frame Decoder
//!
//! Walks a read cursor over the coded frames in the acquisition buffer and
//! decodes one frame per call into the [`PcmQueue`].
//!
//! ## Decode status
//!
//! [`FrameDecoder::decode_once`] reports one of four outcomes, which is the
//! signal the session's worker loop runs on:
//!
//! | Status | Meaning |
//! |--------|---------|
//! | `Succeeded` | one frame decoded, PCM queued, cursor advanced |
//! | `Waiting` | the next frame has not fully arrived; retry later |
//! | `EndEncountered` | no coded data remains and none will follow |
//! | `Failed` | the codec reported a corrupt frame |
//!
//! `Waiting` is never an error: a stream that is still downloading, or a seek
//! past the download frontier, simply waits for more bytes.
//!
//! ## Components
//!
//! - [`symphonia`]: Symphonia-backed codecs for WAVE, MPEG audio and ADTS AAC
//! - [`format_detector`]: codec trial ordering from hints and magic bytes
//! - [`sample_converter`]: conversion into the canonical PCM layout

pub mod format_detector;
pub mod sample_converter;
pub mod symphonia;

use crate::acquisition::AcquisitionTracker;
use crate::parser::FormatDescription;
use crate::pcm_queue::PcmQueue;
use bridge_traits::{FrameCodec, FrameOutcome};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use format_detector::{FormatDetector, FormatHint};
pub use sample_converter::SampleConverter;
pub use self::symphonia::{SymphoniaCodec, SymphoniaCodecFactory};

/// Outcome of one [`FrameDecoder::decode_once`] step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStatus {
    Succeeded,
    Failed(String),
    EndEncountered,
    Waiting,
}

/// Read position of the decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeCursor {
    /// Absolute byte offset of the next coded frame.
    pub byte_position: u64,
    /// Presentation time of the next frame in seconds.
    pub time: f64,
}

/// Frame-by-frame decoder over the acquisition buffer.
pub struct FrameDecoder {
    codec: Box<dyn FrameCodec>,
    description: Arc<FormatDescription>,
    cursor: DecodeCursor,
    read_window: usize,
    scratch: Vec<u8>,
    ended: bool,
    failure: Option<String>,
    frames_decoded: u64,
}

impl FrameDecoder {
    /// Create a decoder positioned at the first coded frame.
    ///
    /// `codec` must already be primed for `description`.
    pub fn new(
        codec: Box<dyn FrameCodec>,
        description: Arc<FormatDescription>,
        read_window: usize,
    ) -> Self {
        let read_window = read_window.max(description.header.max_frame_bytes).max(1);
        Self {
            cursor: DecodeCursor {
                byte_position: description.data_offset(),
                time: 0.0,
            },
            codec,
            description,
            scratch: Vec::with_capacity(read_window * 2),
            read_window,
            ended: false,
            failure: None,
            frames_decoded: 0,
        }
    }

    pub fn cursor(&self) -> DecodeCursor {
        self.cursor
    }

    pub fn description(&self) -> &Arc<FormatDescription> {
        &self.description
    }

    /// `true` once `EndEncountered` was reported.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// PCM frames decoded since creation or the last seek.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Decode the frame at the cursor and append its PCM to `queue`.
    pub fn decode_once(&mut self, tracker: &AcquisitionTracker, queue: &PcmQueue) -> DecodeStatus {
        if let Some(reason) = &self.failure {
            return DecodeStatus::Failed(reason.clone());
        }
        if self.ended {
            return DecodeStatus::EndEncountered;
        }

        let epoch = queue.epoch();
        let acquisition = tracker.state();
        let received = acquisition.received_length;

        // Offset where coded data ends for good, once that is known.
        let stream_end = match (self.description.data_end(), acquisition.finished) {
            (Some(data_end), true) => Some(data_end.min(received)),
            (Some(data_end), false) => Some(data_end),
            (None, true) => Some(received),
            (None, false) => None,
        };

        let position = self.cursor.byte_position;
        if stream_end.is_some_and(|end| position >= end) {
            return self.finish(queue);
        }
        if position >= received {
            return DecodeStatus::Waiting;
        }

        let mut window = self.read_window as u64;
        if let Some(end) = stream_end {
            window = window.min(end - position);
        }
        let data = tracker.read_bytes(position, window as usize);
        let at_end = stream_end.is_some_and(|end| position + data.len() as u64 >= end);

        self.scratch.clear();
        match self.codec.decode_frame(&data, at_end, &mut self.scratch) {
            FrameOutcome::Decoded { consumed, frames } => {
                if consumed == 0 && frames == 0 {
                    return self.fail(format!("{} made no progress", self.codec.name()));
                }
                self.cursor.byte_position += consumed as u64;
                self.cursor.time += self.description.output_format.frames_to_seconds(frames);
                self.frames_decoded += frames;

                if !queue.write(&self.scratch, epoch) {
                    debug!(epoch, "Decoded frame discarded by a concurrent flush");
                }
                DecodeStatus::Succeeded
            }
            FrameOutcome::Incomplete if at_end => {
                debug!(
                    position,
                    trailing = data.len(),
                    "Trailing bytes do not form a frame"
                );
                self.finish(queue)
            }
            FrameOutcome::Incomplete => DecodeStatus::Waiting,
            FrameOutcome::EndOfStream => self.finish(queue),
            FrameOutcome::Corrupt(reason) => self.fail(reason),
        }
    }

    /// Move the cursor to the frame nearest `seconds` and drop queued PCM.
    ///
    /// `seconds` is clamped to `[0, duration]`. Returns the presentation time
    /// of the frame the cursor now points at.
    pub fn seek_to_time(&mut self, seconds: f64, duration: f64, queue: &PcmQueue) -> f64 {
        let target = if seconds.is_finite() {
            seconds.clamp(0.0, duration.max(0.0))
        } else {
            0.0
        };

        let point = self.codec.seek_point(&self.description.header, target);
        self.codec.reset();
        self.cursor = DecodeCursor {
            byte_position: point.byte_offset.max(self.description.data_offset()),
            time: point.time,
        };
        self.ended = false;
        self.frames_decoded = 0;
        let epoch = queue.flush();

        info!(
            requested = seconds,
            target,
            time = point.time,
            byte_offset = point.byte_offset,
            epoch,
            "Decoder repositioned"
        );
        point.time
    }

    fn finish(&mut self, queue: &PcmQueue) -> DecodeStatus {
        self.ended = true;
        queue.mark_end();
        info!(
            frames = self.frames_decoded,
            time = self.cursor.time,
            "End of coded data"
        );
        DecodeStatus::EndEncountered
    }

    fn fail(&mut self, reason: String) -> DecodeStatus {
        warn!(
            codec = self.codec.name(),
            position = self.cursor.byte_position,
            reason = %reason,
            "Frame decode failed"
        );
        self.failure = Some(reason.clone());
        DecodeStatus::Failed(reason)
    }
}

impl std::fmt::Debug for FrameDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("codec", &self.codec.name())
            .field("cursor", &self.cursor)
            .field("ended", &self.ended)
            .field("failure", &self.failure)
            .finish()
    }
}
