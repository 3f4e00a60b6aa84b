//! Command implementations
//!
//! Every command is an `impl Repository` block writing its output through the
//! repository writer. Commands fall into two groups:
//!
//! - `plumbing`: Low-level access to objects, the index and references (cat-file, ls-tree)
//! - `porcelain`: Everyday workflows (init, add, commit, checkout)

pub mod plumbing;
pub mod porcelain;
