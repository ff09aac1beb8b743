use static_assertions::const_assert;

/// log2 of the number of bytes in a reference slot of the target heap.
/// The generated routines always run on a 64-bit host, regardless of where the generator runs.
pub const LOG_BYTES_IN_HEAP_REF: u8 = 3;
/// The number of bytes in a reference slot of the target heap
pub const BYTES_IN_HEAP_REF: usize = 1 << LOG_BYTES_IN_HEAP_REF;

/// log2 of the number of bytes in a cache line of the target machine
pub const LOG_BYTES_IN_CACHE_LINE: u8 = 6;
/// The number of bytes in a cache line of the target machine
pub const BYTES_IN_CACHE_LINE: usize = 1 << LOG_BYTES_IN_CACHE_LINE;

/// Arrays longer than this are split into chunks by the parallel marking variants.
pub const DEFAULT_ARRAY_CHUNK_THRESHOLD: usize = 4096;
/// The number of slots in one array chunk.
pub const DEFAULT_ARRAY_CHUNK_SIZE: usize = 1024;

const_assert!(DEFAULT_ARRAY_CHUNK_SIZE <= DEFAULT_ARRAY_CHUNK_THRESHOLD);
const_assert!(BYTES_IN_CACHE_LINE % BYTES_IN_HEAP_REF == 0);

/// Host-side names of the chunking constants. The generated code reads the collector's globals
/// rather than baking our numbers in.
pub mod host_symbols {
    pub const ARRAY_CHUNK_THRESHOLD: &str = "GPGCArrayChunkThreshold";
    pub const ARRAY_CHUNK_SIZE: &str = "GPGCArrayChunkSize";
    pub const CACHE_LINE_BYTES: &str = "BytesPerCacheLine";
}
