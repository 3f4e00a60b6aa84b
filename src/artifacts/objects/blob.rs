//! Blob object
//!
//! Blobs store file content verbatim. The payload is opaque bytes; names and
//! permissions live in the trees that point at the blob.

use crate::artifacts::objects::object::Packable;
use bytes::Bytes;
use derive_new::new;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    data: Bytes,
}

impl Blob {
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(self.data.clone())
    }
}
