//! Core repository components
//!
//! - `database`: Loose object database for blobs, trees, commits and tags
//! - `index`: Staging area (index/cache)
//! - `refs`: Reference management and name resolution (HEAD, branches, tags)
//! - `repository`: Ties the other areas together for the commands
//! - `workspace`: Working tree file system operations

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
