//! Porcelain commands (user-facing operations)
//!
//! Porcelain commands compose the object store, the index and the references into
//! everyday workflows.
//!
//! ## Commands
//!
//! - `init`: Initialize a new repository
//! - `add`: Stage files for commit
//! - `rm`: Unstage files and remove them from the working tree
//! - `commit`: Create a new commit from the index
//! - `checkout`: Write the tree of a commit into an empty directory

pub mod add;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod rm;
