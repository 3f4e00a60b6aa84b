use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::Packable;
use crate::errors::StoreError;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    pub version: u32,
    pub entries_count: u32,
}

impl IndexHeader {
    pub fn new(entries_count: u32) -> Self {
        IndexHeader {
            version: VERSION,
            entries_count,
        }
    }

    /// Decode and validate the first 12 bytes of an index file
    pub fn parse(bytes: &[u8]) -> anyhow::Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::malformed(format!(
                "index header is {} bytes, expected {HEADER_SIZE}",
                bytes.len()
            )));
        }

        if &bytes[0..4] != SIGNATURE {
            return Err(StoreError::malformed("invalid index file signature"));
        }

        let version = byteorder::NetworkEndian::read_u32(&bytes[4..8]);
        if version != VERSION {
            return Err(StoreError::malformed(format!(
                "unsupported index file version: {version}"
            )));
        }

        Ok(IndexHeader {
            version,
            entries_count: byteorder::NetworkEndian::read_u32(&bytes[8..12]),
        })
    }
}

impl Packable for IndexHeader {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.write_all(SIGNATURE)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.version)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.entries_count)?;

        Ok(Bytes::from(bytes))
    }
}
