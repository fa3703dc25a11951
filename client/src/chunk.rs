//! Chunk planning.
//!
//! A node caps the size of one call, so an append-style payload larger
//! than `chunk_size` is split into ordered pieces, each of which becomes a
//! transaction of its own. Piece `i` covers bytes
//! `[i * chunk_size, min((i + 1) * chunk_size, len))` and is submitted under
//! the base transaction id shifted by `i * CHUNK_INTERVAL_SECS` seconds.
//!
//! Planning is pure arithmetic. It never touches the payload itself.

use std::ops::Range;

use crate::config::CHUNK_INTERVAL_SECS;
use crate::error::{Error, Result};
use crate::id::TransactionId;

/// Number of chunks needed for `len` bytes at `chunk_size` bytes each.
///
/// `chunk_size` must be non-zero.
pub fn required_chunks(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size)
}

/// The id chunk `index` is submitted under.
///
/// Index 0 keeps `base` unchanged.
pub fn chunk_transaction_id(base: &TransactionId, index: usize) -> TransactionId {
    base.offset_seconds(index as u64 * CHUNK_INTERVAL_SECS)
}

/// How a payload of a given length splits into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    len: usize,
    chunk_size: usize,
    chunks: usize,
}

impl ChunkPlan {
    /// Plans `len` bytes in pieces of `chunk_size`, allowing at most
    /// `max_chunks` pieces.
    pub fn new(len: usize, chunk_size: usize, max_chunks: usize) -> Result<Self> {
        if chunk_size == 0 || max_chunks == 0 {
            return Err(Error::InvalidChunkConfig {
                chunk_size,
                max_chunks,
            });
        }
        let chunks = required_chunks(len, chunk_size);
        if chunks > max_chunks {
            return Err(Error::PayloadTooLarge { chunks, max_chunks });
        }
        Ok(Self {
            len,
            chunk_size,
            chunks,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// `ceil(len / chunk_size)`. Zero for an empty payload.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Number of transactions actually submitted.
    ///
    /// An empty payload is still one (empty) submission.
    pub fn submissions(&self) -> usize {
        self.chunks.max(1)
    }

    /// Byte range of submission `index`, or `None` past the last one.
    /// Empty for the single submission of an empty payload.
    pub fn range(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.submissions() {
            return None;
        }
        let start = (index * self.chunk_size).min(self.len);
        let end = ((index + 1) * self.chunk_size).min(self.len);
        Some(start..end)
    }

    /// All submission ranges, in order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.submissions()).filter_map(move |i| self.range(i))
    }

    /// The ids of every submission, derived from `base`.
    pub fn transaction_ids(&self, base: &TransactionId) -> Vec<TransactionId> {
        (0..self.submissions())
            .map(|i| chunk_transaction_id(base, i))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
