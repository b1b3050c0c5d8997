//! Binary recording format (.ttrp)
//!
//! Compact storage for recorded sessions with optional LZ4 compression of the
//! event stream and an xxh3 checksum to detect corruption.
//!
//! # File Structure
//!
//! ```text
//! magic: b"TTRP"
//! header (24 bytes)
//!   sim_id: u8
//!   flags: u8
//!   reserved: [u8; 6]
//!   seed: u64
//!   event_count: u64
//! event block
//!   block_len: u32
//!   block: [u8; block_len]      (LZ4, size-prepended, if flagged)
//!     per event: tick_delta: u64, payload_len: u32, payload
//! checkpoints (if flagged)
//!   count: u32
//!   per checkpoint: event_index: u64, len: u32, LZ4 state
//! trailer
//!   checksum: u64               (xxh3 of the uncompressed event block)
//! ```
//!
//! All integers are little-endian.

mod reader;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// File magic
pub const MAGIC: [u8; 4] = *b"TTRP";

/// File extension used by directory-backed recording sources
pub const FILE_EXTENSION: &str = "ttrp";

/// Header size in bytes, excluding the magic
pub const HEADER_SIZE: usize = 24;

/// Upper bound on any single length-prefixed block (guards allocations on
/// corrupt input)
pub const MAX_BLOCK_SIZE: usize = 256 * 1024 * 1024;
