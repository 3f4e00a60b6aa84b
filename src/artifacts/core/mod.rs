//! Ambient settings shared by the command layer
//!
//! - `config`: values resolved once from the environment and passed explicitly
//! - `identity`: the author/committer stamped onto new commits

pub mod config;
pub mod identity;
