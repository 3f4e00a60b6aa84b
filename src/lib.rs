//! A content-addressed object store with a staging index, references and ignore
//! rules, stored in the on-disk layout of a `.git` directory.

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
