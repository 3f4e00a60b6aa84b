//! Plumbing commands (low-level operations)
//!
//! Plumbing commands provide direct access to the object database, the index and
//! references. They're primarily used for scripting and as building blocks for
//! porcelain commands.
//!
//! ## Commands
//!
//! - `cat-file`: Print an object's payload
//! - `check-ignore`: Report which paths the ignore rules exclude
//! - `hash-object`: Compute object ID and optionally store in database
//! - `ls-files`: List index entries
//! - `ls-tree`: List contents of a tree object
//! - `rev-parse`: Resolve a name to an object ID
//! - `show-ref`: List references

pub mod cat_file;
pub mod check_ignore;
pub mod hash_object;
pub mod ls_files;
pub mod ls_tree;
pub mod rev_parse;
pub mod show_ref;
