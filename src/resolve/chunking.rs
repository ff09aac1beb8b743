//! Chunked traversal of long reference arrays.
//!
//! An array longer than the threshold is split so parallel workers can share it. Elements before
//! the first cache-line boundary are visited inline, then every full chunk of `chunk_size`
//! elements is enqueued as one unit of work, then the remaining tail is visited inline.
//! [`ChunkPartition`] computes the three index ranges for a concrete array; the generated loop
//! performs the same computation at run time.

use crate::util::constants::BYTES_IN_HEAP_REF;
use crate::util::error::{GenError, Result};
use crate::util::options::Options;
use std::ops::Range;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkingConfig {
    /// Arrays with at most this many elements are never chunked (T).
    pub threshold: usize,
    /// Elements per enqueued chunk (C).
    pub chunk_size: usize,
    /// Chunk boundaries are aligned to this many bytes (A).
    pub alignment: usize,
}

impl From<&Options> for ChunkingConfig {
    fn from(options: &Options) -> Self {
        ChunkingConfig {
            threshold: options.array_chunk_threshold,
            chunk_size: options.array_chunk_size,
            alignment: options.cache_line_bytes,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::from(&Options::builtin())
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: usize, reason: &str| GenError::Options {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };
        if self.threshold == 0 {
            return Err(invalid("array_chunk_threshold", self.threshold, "must be positive"));
        }
        if self.chunk_size == 0 || self.chunk_size > self.threshold {
            return Err(invalid(
                "array_chunk_size",
                self.chunk_size,
                "must be positive and no larger than the chunk threshold",
            ));
        }
        if !self.alignment.is_power_of_two() || self.alignment % BYTES_IN_HEAP_REF != 0 {
            return Err(invalid(
                "cache_line_bytes",
                self.alignment,
                "must be a power of two and a whole number of reference slots",
            ));
        }
        Ok(())
    }
}

/// The split of one array into an inline prefix, enqueued chunks and an inline tail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkPartition {
    pub prefix: Range<usize>,
    /// Indices covered by enqueued chunks. Always a whole number of chunks.
    pub chunks: Range<usize>,
    pub chunk_size: usize,
    pub tail: Range<usize>,
}

impl ChunkPartition {
    /// Partition an array of `len` slots starting at byte address `base_addr`.
    pub fn compute(base_addr: usize, len: usize, config: &ChunkingConfig) -> Self {
        debug_assert!(base_addr % BYTES_IN_HEAP_REF == 0, "unaligned array base {:#x}", base_addr);
        if len <= config.threshold {
            return ChunkPartition {
                prefix: 0..0,
                chunks: 0..0,
                chunk_size: config.chunk_size,
                tail: 0..len,
            };
        }
        let aligned = align_up(base_addr, config.alignment);
        let prefix_end = ((aligned - base_addr) / BYTES_IN_HEAP_REF).min(len);
        let chunk_count = (len - prefix_end) / config.chunk_size;
        let chunks_end = prefix_end + chunk_count * config.chunk_size;
        ChunkPartition {
            prefix: 0..prefix_end,
            chunks: prefix_end..chunks_end,
            chunk_size: config.chunk_size,
            tail: chunks_end..len,
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len() / self.chunk_size
    }

    pub fn is_chunked(&self) -> bool {
        !self.chunks.is_empty()
    }

    /// The enqueued units of work, in enqueue order.
    pub fn chunk_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.chunk_count()).map(move |i| {
            let start = self.chunks.start + i * self.chunk_size;
            start..start + self.chunk_size
        })
    }

    /// Indices visited inline by the traversing worker, in visit order.
    pub fn inline_indices(&self) -> impl Iterator<Item = usize> {
        self.prefix.clone().chain(self.tail.clone())
    }
}

fn align_up(addr: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (addr + align - 1) & !(align - 1)
}
