//! Object identifier (SHA-1 hash)
//!
//! Object IDs are 40-character lowercase hexadecimal strings. On disk they appear in
//! two encodings: as hex text (reference files, KVLM headers) and as 20 raw bytes
//! (tree entries, index entries).
//!
//! ## Storage
//!
//! Loose objects live at `objects/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::{OBJECT_ID_LENGTH, RAW_OBJECT_ID_LENGTH};
use crate::errors::StoreError;
use sha1::{Digest, Sha1};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID, normalizing it to lowercase
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(StoreError::malformed(format!(
                "invalid object id length {}: {id}",
                id.len()
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StoreError::malformed(format!(
                "invalid object id characters: {id}"
            )));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Hash arbitrary bytes into an object ID
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);

        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn from_raw(raw: &[u8; RAW_OBJECT_ID_LENGTH]) -> Self {
        Self(raw.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// The 20 raw bytes behind the hex representation
    pub fn to_raw(&self) -> [u8; RAW_OBJECT_ID_LENGTH] {
        let mut raw = [0u8; RAW_OBJECT_ID_LENGTH];
        for (i, byte) in raw.iter_mut().enumerate() {
            // validated as hex on construction
            *byte = u8::from_str_radix(&self.0[i * 2..i * 2 + 2], 16).unwrap_or_default();
        }
        raw
    }

    /// Write the object ID in binary format (20 bytes)
    pub fn write_raw_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        writer.write_all(&self.to_raw())?;
        Ok(())
    }

    /// Read an object ID from binary format (20 bytes)
    pub fn read_raw_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut raw = [0u8; RAW_OBJECT_ID_LENGTH];
        reader
            .read_exact(&mut raw)
            .map_err(|_| StoreError::malformed("truncated raw object id"))?;

        Ok(Self::from_raw(&raw))
    }

    /// Splits the hash as `XX/YYYYYY...`, relative to the objects directory
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
