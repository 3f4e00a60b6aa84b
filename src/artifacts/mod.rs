//! On-disk data structures and their codecs
//!
//! - `core`: Configuration and commit identity
//! - `ignore`: Ignore rules and the scoped matcher
//! - `index`: Index/staging area data structures
//! - `objects`: Object types (blob, tree, commit, tag) and the KVLM encoding

pub mod core;
pub mod ignore;
pub mod index;
pub mod objects;
