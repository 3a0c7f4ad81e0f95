//! # Ring Buffer for PCM Audio Samples
//!
//! Fixed-capacity circular buffer of interleaved `i16` samples shared between
//! the decode worker (producer) and the real-time render callback (consumer).
//!
//! ## Design
//!
//! - **Capacity**: Fixed size determined at creation; storage is allocated once
//! - **Backpressure**: Writes never overwrite unread samples; a full buffer
//!   accepts only what fits and reports the count
//! - **Locking**: One `parking_lot::Mutex` held for a bounded copy; the
//!   consumer never allocates
//!
//! ## Usage
//!
//! ```rust
//! use core_playback::ring_buffer::RingBuffer;
//!
//! // One second of stereo audio at 44.1kHz
//! let buffer = RingBuffer::new(44100 * 2);
//!
//! let written = buffer.write(&[100, -100, 200, -200]);
//! assert_eq!(written, 4);
//!
//! let mut output = [0i16; 1024];
//! let read = buffer.read(&mut output);
//! assert_eq!(read, 4);
//! ```

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone)]
pub struct RingBuffer {
    inner: Arc<RingBufferInner>,
}

struct RingBufferInner {
    state: Mutex<RingState>,
    capacity: usize,
}

struct RingState {
    samples: Vec<i16>,
    /// Index of the oldest unread sample.
    head: usize,
    /// Number of unread samples.
    len: usize,
}

impl RingBuffer {
    /// Create a new ring buffer with the specified capacity in samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(RingBufferInner {
                state: Mutex::new(RingState {
                    samples: vec![0; capacity],
                    head: 0,
                    len: 0,
                }),
                capacity,
            }),
        }
    }

    /// Write samples to the ring buffer.
    ///
    /// Returns the number of samples actually written, which is less than
    /// `samples.len()` when the buffer fills up.
    pub fn write(&self, samples: &[i16]) -> usize {
        if samples.is_empty() {
            return 0;
        }

        let capacity = self.inner.capacity;
        let mut state = self.inner.state.lock();
        let to_write = samples.len().min(capacity - state.len);
        if to_write == 0 {
            return 0;
        }

        let tail = (state.head + state.len) % capacity;
        let first = to_write.min(capacity - tail);
        state.samples[tail..tail + first].copy_from_slice(&samples[..first]);
        if first < to_write {
            state.samples[..to_write - first].copy_from_slice(&samples[first..to_write]);
        }
        state.len += to_write;

        to_write
    }

    /// Read samples from the ring buffer.
    ///
    /// Fills `output` with as many samples as available, up to `output.len()`.
    /// Returns the number of samples actually read.
    pub fn read(&self, output: &mut [i16]) -> usize {
        if output.is_empty() {
            return 0;
        }

        let capacity = self.inner.capacity;
        let mut state = self.inner.state.lock();
        let to_read = state.len.min(output.len());
        if to_read == 0 {
            return 0;
        }

        let head = state.head;
        let first = to_read.min(capacity - head);
        output[..first].copy_from_slice(&state.samples[head..head + first]);
        if first < to_read {
            output[first..to_read].copy_from_slice(&state.samples[..to_read - first]);
        }
        state.head = (head + to_read) % capacity;
        state.len -= to_read;

        to_read
    }

    /// Returns the number of samples currently available to read.
    pub fn available(&self) -> usize {
        self.inner.state.lock().len
    }

    /// Returns the number of samples that can be written without rejection.
    pub fn free_space(&self) -> usize {
        self.inner.capacity - self.available()
    }

    /// Returns the total capacity of the buffer in samples.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Returns the buffer fill percentage (0.0 to 1.0).
    pub fn fill_level(&self) -> f32 {
        self.available() as f32 / self.inner.capacity as f32
    }

    /// Discard all unread samples.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.head = 0;
        state.len = 0;
    }

    /// Returns `true` if the buffer has no samples available.
    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// Returns `true` if the buffer is full.
    pub fn is_full(&self) -> bool {
        self.available() == self.inner.capacity
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.inner.capacity)
            .field("available", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_creation() {
        let buffer = RingBuffer::new(1024);
        assert_eq!(buffer.capacity(), 1024);
        assert_eq!(buffer.available(), 0);
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());
    }

    #[test]
    fn test_ring_buffer_write_read() {
        let buffer = RingBuffer::new(1024);

        let samples = vec![1, 2, 3, 4];
        assert_eq!(buffer.write(&samples), 4);
        assert_eq!(buffer.available(), 4);

        let mut output = vec![0; 4];
        assert_eq!(buffer.read(&mut output), 4);
        assert_eq!(output, samples);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_ring_buffer_wrap_around() {
        let buffer = RingBuffer::new(8);

        buffer.write(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(buffer.is_full());

        let mut output = vec![0; 4];
        buffer.read(&mut output);
        assert_eq!(output, vec![1, 2, 3, 4]);

        assert_eq!(buffer.write(&[9, 10, 11, 12]), 4);

        let mut output = vec![0; 8];
        assert_eq!(buffer.read(&mut output), 8);
        assert_eq!(output, vec![5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_ring_buffer_rejects_when_full() {
        let buffer = RingBuffer::new(4);

        assert_eq!(buffer.write(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(buffer.write(&[7]), 0);

        let mut output = vec![0; 6];
        assert_eq!(buffer.read(&mut output), 4);
        assert_eq!(&output[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_ring_buffer_partial_read() {
        let buffer = RingBuffer::new(1024);
        buffer.write(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        let mut output = vec![0; 5];
        assert_eq!(buffer.read(&mut output), 5);
        assert_eq!(output, vec![1, 2, 3, 4, 5]);
        assert_eq!(buffer.available(), 5);
    }

    #[test]
    fn test_ring_buffer_fill_level_and_free_space() {
        let buffer = RingBuffer::new(100);
        buffer.write(&[1; 30]);

        assert_eq!(buffer.free_space(), 70);
        assert!((buffer.fill_level() - 0.3).abs() < 0.01);
    }

    #[test]
    fn test_ring_buffer_clear() {
        let buffer = RingBuffer::new(16);
        buffer.write(&[1, 2, 3, 4]);

        buffer.clear();
        assert!(buffer.is_empty());

        // Fresh writes start from a clean head.
        buffer.write(&[9]);
        let mut output = [0; 2];
        assert_eq!(buffer.read(&mut output), 1);
        assert_eq!(output[0], 9);
    }
}
