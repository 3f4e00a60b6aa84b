//! Object types and their payload codecs
//!
//! Every stored object is identified by the SHA-1 of its frame. There are four types:
//!
//! - **Blob**: File content (raw bytes)
//! - **Tree**: Directory listing (modes, names and object IDs)
//! - **Commit**: Snapshot with metadata (tree, parents, author, message)
//! - **Tag**: Annotated pointer to another object
//!
//! Commits and tags share the KVLM header encoding (`kvlm`). The frame itself,
//! `<type> <size>\0<content>`, lives in `object`.

pub mod blob;
pub mod commit;
pub mod kvlm;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a SHA-1 hash in its raw binary form
pub const RAW_OBJECT_ID_LENGTH: usize = 20;
