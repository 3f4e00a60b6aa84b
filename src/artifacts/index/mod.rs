//! Index file format
//!
//! The index (also called staging area or cache) is the binary snapshot of what
//! would become the next commit's tree.
//!
//! ## File Format (Version 2)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length):
//!   - 62 bytes of fixed fields, the path and a NUL terminator
//!   - Each entry padded with NULs to 8-byte alignment
//!
//! Extensions (ignored when reading, never written)
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12; // 4 bytes for signature, 4 for version, 4 for entries_count

/// Magic signature identifying index files
pub const SIGNATURE: &[u8; 4] = b"DIRC";

/// Index file format version
pub const VERSION: u32 = 2;

/// Size of the fixed part of an entry, up to and including the flags field
pub const ENTRY_FIXED_SIZE: usize = 62;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Largest value the 12-bit name length field can hold
pub const MAX_NAME_LENGTH: usize = 0xFFF;
