//! Typed objects and the loose-object frame
//!
//! A stored object is framed as `<type> SP <payload-length> NUL <payload>`; the object ID
//! is the SHA-1 of the whole frame. [`GitObject`] is the closed set of payload variants,
//! with the frame's type token as its discriminator.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::{Commit, Tag};
use crate::artifacts::objects::kvlm::Kvlm;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::StoreError;
use anyhow::Result;
use bytes::Bytes;
use std::io::BufRead;

pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GitObject {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl GitObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            GitObject::Blob(_) => ObjectType::Blob,
            GitObject::Tree(_) => ObjectType::Tree,
            GitObject::Commit(_) => ObjectType::Commit,
            GitObject::Tag(_) => ObjectType::Tag,
        }
    }

    /// Dispatch a raw payload to the decoder matching its type
    pub fn decode(object_type: ObjectType, payload: Bytes) -> Result<Self> {
        let reader = std::io::Cursor::new(payload.clone());

        Ok(match object_type {
            ObjectType::Blob => GitObject::Blob(Blob::new(payload)),
            ObjectType::Tree => GitObject::Tree(Tree::deserialize(reader)?),
            ObjectType::Commit => GitObject::Commit(Commit::new(Kvlm::deserialize(reader)?)),
            ObjectType::Tag => GitObject::Tag(Tag::new(Kvlm::deserialize(reader)?)),
        })
    }

    /// The KVLM block of commits and tags
    pub fn kvlm(&self) -> Option<&Kvlm> {
        match self {
            GitObject::Commit(commit) => Some(commit.kvlm()),
            GitObject::Tag(tag) => Some(tag.kvlm()),
            GitObject::Blob(_) | GitObject::Tree(_) => None,
        }
    }
}

impl Packable for GitObject {
    fn serialize(&self) -> Result<Bytes> {
        match self {
            GitObject::Blob(blob) => blob.serialize(),
            GitObject::Tree(tree) => tree.serialize(),
            GitObject::Commit(commit) => commit.serialize(),
            GitObject::Tag(tag) => tag.serialize(),
        }
    }
}

/// Build the framed buffer that is hashed and stored
pub fn frame(object_type: ObjectType, payload: &[u8]) -> Bytes {
    let header = format!("{} {}\0", object_type.as_str(), payload.len());

    let mut framed = Vec::with_capacity(header.len() + payload.len());
    framed.extend_from_slice(header.as_bytes());
    framed.extend_from_slice(payload);

    Bytes::from(framed)
}

/// Split a decompressed frame into its type and payload, validating the length field
pub fn unframe(raw: Bytes) -> Result<(ObjectType, Bytes)> {
    let space = raw
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| StoreError::malformed("object frame has no type separator"))?;
    let nul = raw[space..]
        .iter()
        .position(|&b| b == 0)
        .map(|offset| space + offset)
        .ok_or_else(|| StoreError::malformed("object frame has no header terminator"))?;

    let object_type = ObjectType::parse_frame_token(&raw[..space])?;

    let length = std::str::from_utf8(&raw[space + 1..nul])
        .ok()
        .and_then(|length| length.parse::<usize>().ok())
        .ok_or_else(|| StoreError::malformed("object frame has a non-numeric length"))?;

    let payload = raw.slice(nul + 1..);
    if length != payload.len() {
        return Err(StoreError::malformed(format!(
            "bad length: header says {length}, payload has {}",
            payload.len()
        )));
    }

    Ok((object_type, payload))
}

pub fn hash(object_type: ObjectType, payload: &[u8]) -> ObjectId {
    ObjectId::digest(&frame(object_type, payload))
}
