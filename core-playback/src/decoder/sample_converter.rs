//! # Sample Format Converter
//!
//! Folds decoded samples into the canonical renderer layout (signed 16-bit
//! little-endian, interleaved stereo) and canonical samples into the `f32`
//! the output device consumes.

/// Stateless sample conversion helpers.
pub struct SampleConverter;

impl SampleConverter {
    /// Fold interleaved 16-bit samples into canonical PCM appended to `out`.
    ///
    /// Mono is duplicated into both output channels; sources with more than
    /// two channels keep the first two. A trailing partial frame is ignored.
    /// Returns the number of frames converted.
    pub fn interleaved_to_standard(samples: &[i16], channels: usize, out: &mut Vec<u8>) -> usize {
        if channels == 0 {
            return 0;
        }

        let frames = samples.len() / channels;
        out.reserve(frames * 4);

        for frame in samples.chunks_exact(channels) {
            let left = frame[0];
            let right = if channels == 1 { left } else { frame[1] };
            out.extend_from_slice(&left.to_le_bytes());
            out.extend_from_slice(&right.to_le_bytes());
        }

        frames
    }

    /// Reinterpret canonical PCM bytes as samples, appending to `out`.
    pub fn bytes_to_samples(bytes: &[u8], out: &mut Vec<i16>) {
        out.extend(
            bytes
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]])),
        );
    }

    /// Scale `input` by `gain` into normalised `f32` output.
    ///
    /// `output` must be at least as long as `input`.
    pub fn apply_gain(input: &[i16], output: &mut [f32], gain: f32) {
        let scale = gain / 32768.0;
        for (dst, &src) in output.iter_mut().zip(input) {
            *dst = src as f32 * scale;
        }
    }
}
