//! # PCM Queue
//!
//! Ordered FIFO of decoded PCM chunks between the decode worker and the
//! renderer feed.
//!
//! Chunks are delivered in exact write order; nothing is reordered, duplicated
//! or lost outside an explicit [`PcmQueue::flush`]. Storage of consumed chunks
//! goes back to a small free-list so steady-state playback does not allocate.
//!
//! Every flush advances the queue epoch. Producers tag writes with the epoch
//! they started decoding under, so a frame decoded before a seek can never
//! land after the flush that the seek performed.

use parking_lot::Mutex;
use std::collections::VecDeque;

const MAX_RECYCLED: usize = 64;

/// One chunk of canonical PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmChunk {
    pub bytes: Vec<u8>,
    /// Queue epoch the chunk was written under.
    pub epoch: u64,
}

impl PcmChunk {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of [`PcmQueue::read`].
#[derive(Debug, PartialEq, Eq)]
pub enum QueueRead {
    /// The oldest chunk.
    Chunk(PcmChunk),
    /// Nothing queued yet; retry later.
    Empty,
    /// The end marker was reached; no chunk will follow until a flush.
    Ended,
}

struct QueueInner {
    chunks: VecDeque<PcmChunk>,
    free: Vec<Vec<u8>>,
    queued_bytes: usize,
    ended: bool,
    epoch: u64,
}

/// Single-producer, single-consumer chunk queue.
pub struct PcmQueue {
    inner: Mutex<QueueInner>,
}

impl PcmQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                chunks: VecDeque::new(),
                free: Vec::new(),
                queued_bytes: 0,
                ended: false,
                epoch: 0,
            }),
        }
    }

    /// Append a copy of `bytes` as a new chunk.
    ///
    /// Returns `false` when the write was discarded: the queue was flushed
    /// since `epoch`, or the end marker is set.
    pub fn write(&self, bytes: &[u8], epoch: u64) -> bool {
        if bytes.is_empty() {
            return true;
        }

        let mut inner = self.inner.lock();
        if inner.epoch != epoch || inner.ended {
            return false;
        }

        let mut storage = inner.free.pop().unwrap_or_default();
        storage.clear();
        storage.extend_from_slice(bytes);
        inner.queued_bytes += storage.len();
        inner.chunks.push_back(PcmChunk {
            bytes: storage,
            epoch,
        });
        true
    }

    /// Remove and return the oldest chunk.
    pub fn read(&self) -> QueueRead {
        let mut inner = self.inner.lock();
        match inner.chunks.pop_front() {
            Some(chunk) => {
                inner.queued_bytes -= chunk.len();
                QueueRead::Chunk(chunk)
            }
            None if inner.ended => QueueRead::Ended,
            None => QueueRead::Empty,
        }
    }

    /// Return a consumed chunk's storage for reuse.
    pub fn recycle(&self, chunk: PcmChunk) {
        let mut inner = self.inner.lock();
        if inner.free.len() < MAX_RECYCLED {
            inner.free.push(chunk.bytes);
        }
    }

    /// Terminate the sequence: once drained, reads report [`QueueRead::Ended`].
    pub fn mark_end(&self) {
        self.inner.lock().ended = true;
    }

    /// Discard every chunk, clear the end marker and advance the epoch.
    ///
    /// Returns the new epoch.
    pub fn flush(&self) -> u64 {
        let mut inner = self.inner.lock();
        while let Some(chunk) = inner.chunks.pop_front() {
            if inner.free.len() < MAX_RECYCLED {
                inner.free.push(chunk.bytes);
            }
        }
        inner.queued_bytes = 0;
        inner.ended = false;
        inner.epoch += 1;
        inner.epoch
    }

    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    /// Total bytes waiting in the queue.
    pub fn queued_bytes(&self) -> usize {
        self.inner.lock().queued_bytes
    }

    /// Size of the oldest chunk, if any.
    pub fn front_len(&self) -> Option<usize> {
        self.inner.lock().chunks.front().map(PcmChunk::len)
    }

    /// Number of queued chunks.
    pub fn len(&self) -> usize {
        self.inner.lock().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().chunks.is_empty()
    }

    /// `true` once the end marker is set and every chunk was read.
    pub fn is_drained(&self) -> bool {
        let inner = self.inner.lock();
        inner.ended && inner.chunks.is_empty()
    }
}

impl Default for PcmQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PcmQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PcmQueue")
            .field("chunks", &inner.chunks.len())
            .field("queued_bytes", &inner.queued_bytes)
            .field("ended", &inner.ended)
            .field("epoch", &inner.epoch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_bytes(queue: &PcmQueue) -> Option<Vec<u8>> {
        match queue.read() {
            QueueRead::Chunk(chunk) => Some(chunk.bytes),
            _ => None,
        }
    }

    #[test]
    fn preserves_write_order() {
        let queue = PcmQueue::new();
        assert!(queue.write(&[1, 2], 0));
        assert!(queue.write(&[3], 0));
        assert!(queue.write(&[4, 5, 6], 0));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.queued_bytes(), 6);
        assert_eq!(queue.front_len(), Some(2));

        assert_eq!(read_bytes(&queue), Some(vec![1, 2]));
        assert_eq!(read_bytes(&queue), Some(vec![3]));
        assert_eq!(read_bytes(&queue), Some(vec![4, 5, 6]));
        assert_eq!(queue.read(), QueueRead::Empty);
    }

    #[test]
    fn end_marker_reports_ended_after_drain() {
        let queue = PcmQueue::new();
        queue.write(&[1], 0);
        queue.mark_end();

        assert!(!queue.write(&[2], 0));
        assert!(!queue.is_drained());
        assert_eq!(read_bytes(&queue), Some(vec![1]));
        assert_eq!(queue.read(), QueueRead::Ended);
        assert!(queue.is_drained());
    }

    #[test]
    fn flush_discards_and_rejects_stale_writes() {
        let queue = PcmQueue::new();
        queue.write(&[1, 1], 0);
        queue.mark_end();

        let epoch = queue.flush();
        assert_eq!(epoch, 1);
        assert_eq!(queue.queued_bytes(), 0);
        assert_eq!(queue.read(), QueueRead::Empty);

        // A frame decoded before the flush is dropped.
        assert!(!queue.write(&[9], 0));
        assert!(queue.write(&[7], epoch));
        assert_eq!(read_bytes(&queue), Some(vec![7]));
    }

    #[test]
    fn recycled_storage_is_reused() {
        let queue = PcmQueue::new();
        queue.write(&[0; 512], 0);

        let QueueRead::Chunk(chunk) = queue.read() else {
            panic!("expected a chunk");
        };
        let capacity = chunk.bytes.capacity();
        queue.recycle(chunk);

        queue.write(&[1; 16], 0);
        let QueueRead::Chunk(chunk) = queue.read() else {
            panic!("expected a chunk");
        };
        assert_eq!(chunk.bytes, vec![1; 16]);
        assert_eq!(chunk.bytes.capacity(), capacity);
    }
}
