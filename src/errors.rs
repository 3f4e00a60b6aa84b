//! Error kinds surfaced by the object store, index and reference layers
//!
//! Every fallible operation in the crate returns `anyhow::Result`; when the failure
//! belongs to one of the kinds below it is raised as a [`StoreError`] so that callers
//! can branch on it with `err.downcast_ref::<StoreError>()`.

use crate::artifacts::objects::object_id::ObjectId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A missing object, reference or reference target.
    #[error("not found: {0}")]
    NotFound(String),

    /// Structurally invalid on-disk data (object frames, trees, KVLM blocks, index files).
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// A name that resolves to more than one object.
    #[error("ambiguous reference {name}: candidates are:\n - {}", join_candidates(.candidates))]
    Ambiguous {
        name: String,
        candidates: Vec<ObjectId>,
    },

    /// A caller contract violation (absolute paths, unsupported object types, bad prefixes).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

fn join_candidates(candidates: &[ObjectId]) -> String {
    candidates
        .iter()
        .map(|oid| oid.as_ref())
        .collect::<Vec<_>>()
        .join("\n - ")
}

impl StoreError {
    pub fn malformed(reason: impl Into<String>) -> anyhow::Error {
        StoreError::MalformedData(reason.into()).into()
    }

    pub fn not_found(what: impl Into<String>) -> anyhow::Error {
        StoreError::NotFound(what.into()).into()
    }

    pub fn invalid_input(reason: impl Into<String>) -> anyhow::Error {
        StoreError::InvalidInput(reason.into()).into()
    }
}
