//! Index entry representation
//!
//! Each entry in the index represents a staged file with:
//! - File path, relative to the repository root, `/`-separated
//! - Content hash (object ID)
//! - Stat metadata (mode, size, timestamps, device/inode, owner)
//! - Merge stage and the assume-valid flag
//!
//! ## Entry Format
//!
//! ```text
//! ctime s | ctime ns | mtime s | mtime ns | dev | ino     (6 x u32)
//! reserved (u16, zero) | mode (u16: 4-bit type, 12-bit permissions)
//! uid | gid | size                                       (3 x u32)
//! sha-1                                                  (20 bytes)
//! flags (u16: assume-valid, extended, 2-bit stage, 12-bit name length)
//! name, NUL, then NUL padding up to a multiple of 8 bytes
//! ```
//!
//! All integers are big-endian.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::{ENTRY_BLOCK, ENTRY_FIXED_SIZE, MAX_NAME_LENGTH};
use crate::artifacts::objects::object::Packable;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::StoreError;
use bitflags::bitflags;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::fs::Metadata;
use std::io::Write;
use std::os::unix::prelude::MetadataExt;
use std::path::Path;

bitflags! {
    /// The 16-bit flags field closing the fixed part of an entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EntryFlags: u16 {
        const ASSUME_VALID = 0x8000;
        const EXTENDED = 0x4000;
        const STAGE = 0x3000;
        const NAME_LENGTH = 0x0FFF;
    }
}

impl EntryFlags {
    pub fn stage(&self) -> u8 {
        ((self.bits() >> 12) & 0b11) as u8
    }

    pub fn name_length(&self) -> usize {
        (self.bits() & Self::NAME_LENGTH.bits()) as usize
    }

    fn compose(assume_valid: bool, stage: u8, name_length: usize) -> Self {
        let mut flags = EntryFlags::from_bits_retain(
            ((stage as u16 & 0b11) << 12) | name_length.min(MAX_NAME_LENGTH) as u16,
        );
        flags.set(EntryFlags::ASSUME_VALID, assume_valid);
        flags
    }
}

/// A staged file
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// File path relative to repository root
    pub name: String,
    /// SHA-1 hash of file content
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
    #[new(default)]
    pub assume_valid: bool,
    /// Merge stage, 0 for a normal entry
    #[new(default)]
    pub stage: u8,
}

/// Stat fields, truncated to the 32 bits the index stores
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub ctime: u32,
    pub ctime_nsec: u32,
    pub mtime: u32,
    pub mtime_nsec: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
}

impl EntryMetadata {
    /// Derive the metadata of a working tree file from its live `lstat`
    pub fn from_stat(file_path: &Path, metadata: &Metadata) -> Self {
        let mode = if metadata.file_type().is_symlink() {
            EntryMode::symlink()
        } else {
            EntryMode::regular(file_path.is_executable())
        };

        EntryMetadata {
            ctime: metadata.ctime() as u32,
            ctime_nsec: metadata.ctime_nsec() as u32,
            mtime: metadata.mtime() as u32,
            mtime_nsec: metadata.mtime_nsec() as u32,
            dev: metadata.dev() as u32,
            ino: metadata.ino() as u32,
            mode,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size() as u32,
        }
    }
}

impl IndexEntry {
    pub fn from_file(name: String, oid: ObjectId, file_path: &Path) -> anyhow::Result<Self> {
        let metadata = std::fs::symlink_metadata(file_path)?;

        Ok(IndexEntry::new(
            name,
            oid,
            EntryMetadata::from_stat(file_path, &metadata),
        ))
    }

    pub fn flags(&self) -> EntryFlags {
        EntryFlags::compose(self.assume_valid, self.stage, self.name.len())
    }

    /// Directories containing this entry, outermost first (`a/b/c` yields `a`, `a/b`)
    pub fn parent_dirs(&self) -> Vec<&str> {
        self.name
            .match_indices('/')
            .map(|(at, _)| &self.name[..at])
            .collect()
    }

    pub fn basename(&self) -> &str {
        self.name
            .rsplit_once('/')
            .map_or(self.name.as_str(), |(_, basename)| basename)
    }

    /// Decode one entry from the start of `bytes`, returning it with the number of
    /// bytes it occupies including padding
    pub fn decode(bytes: &[u8]) -> anyhow::Result<(Self, usize)> {
        if bytes.len() < ENTRY_FIXED_SIZE {
            return Err(StoreError::malformed("truncated index entry"));
        }

        let read_u32 = |at: usize| byteorder::NetworkEndian::read_u32(&bytes[at..at + 4]);

        if byteorder::NetworkEndian::read_u16(&bytes[24..26]) != 0 {
            return Err(StoreError::malformed(
                "reserved index entry mode bits are not zero",
            ));
        }
        let mode = EntryMode::from_u16(byteorder::NetworkEndian::read_u16(&bytes[26..28]))?;

        let metadata = EntryMetadata {
            ctime: read_u32(0),
            ctime_nsec: read_u32(4),
            mtime: read_u32(8),
            mtime_nsec: read_u32(12),
            dev: read_u32(16),
            ino: read_u32(20),
            mode,
            uid: read_u32(28),
            gid: read_u32(32),
            size: read_u32(36),
        };

        let oid = ObjectId::read_raw_from(&mut &bytes[40..60])?;

        let flags = EntryFlags::from_bits_retain(byteorder::NetworkEndian::read_u16(&bytes[60..62]));
        if flags.contains(EntryFlags::EXTENDED) {
            return Err(StoreError::malformed(
                "extended flag set in a version 2 index entry",
            ));
        }

        let name_end = if flags.name_length() < MAX_NAME_LENGTH {
            let name_end = ENTRY_FIXED_SIZE + flags.name_length();
            if bytes.get(name_end) != Some(&0) {
                return Err(StoreError::malformed(
                    "index entry name is not NUL terminated",
                ));
            }
            name_end
        } else {
            // the stored length saturated, so the name runs to the next NUL
            let scan_from = ENTRY_FIXED_SIZE + MAX_NAME_LENGTH;
            bytes
                .get(scan_from..)
                .and_then(|rest| rest.iter().position(|&b| b == 0))
                .map(|offset| scan_from + offset)
                .ok_or_else(|| {
                    StoreError::malformed("index entry name is not NUL terminated")
                })?
        };

        let name = std::str::from_utf8(&bytes[ENTRY_FIXED_SIZE..name_end])
            .map_err(|_| StoreError::malformed("index entry name is not valid UTF-8"))?
            .to_string();

        let size = (name_end + 1).next_multiple_of(ENTRY_BLOCK);
        if size > bytes.len() {
            return Err(StoreError::malformed("truncated index entry padding"));
        }

        let entry = IndexEntry {
            name,
            oid,
            metadata,
            assume_valid: flags.contains(EntryFlags::ASSUME_VALID),
            stage: flags.stage(),
        };

        Ok((entry, size))
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let metadata = &self.metadata;

        let mut entry_bytes = Vec::with_capacity(ENTRY_FIXED_SIZE + self.name.len() + ENTRY_BLOCK);
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.ctime)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.ctime_nsec)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.mtime)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.mtime_nsec)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.dev)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.ino)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(0)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(metadata.mode.as_u16())?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.uid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.gid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.size)?;
        self.oid.write_raw_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(self.flags().bits())?;
        entry_bytes.write_all(self.name.as_bytes())?;

        // There must be at least one null byte at the end
        entry_bytes.push(0);
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::ModeType;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn entry() -> IndexEntry {
        IndexEntry::new(
            "src/main.rs".to_string(),
            ObjectId::try_parse("ce013625030ba8dba906f756967f9e9ca394464a".to_string()).unwrap(),
            EntryMetadata {
                ctime: 1_700_000_000,
                ctime_nsec: 12,
                mtime: 1_700_000_001,
                mtime_nsec: 34,
                dev: 2049,
                ino: 777,
                mode: EntryMode::regular(true),
                uid: 1000,
                gid: 100,
                size: 6,
            },
        )
    }

    fn malformed(error: anyhow::Error) -> bool {
        matches!(
            error.downcast_ref::<StoreError>(),
            Some(StoreError::MalformedData(_))
        )
    }

    #[rstest]
    fn encoded_entry_is_padded_to_eight_bytes(entry: IndexEntry) {
        let bytes = entry.serialize().unwrap();

        // 62 fixed + 11 name + 1 NUL = 74, padded to 80
        assert_eq!(bytes.len(), 80);
        assert_eq!(&bytes[26..28], &0o100755u16.to_be_bytes());
        assert_eq!(&bytes[60..62], &[0x00, 0x0B]);
        assert_eq!(&bytes[62..73], b"src/main.rs");
        assert!(bytes[73..].iter().all(|&b| b == 0));
    }

    #[rstest]
    fn decoding_an_encoded_entry_returns_it_with_its_size(entry: IndexEntry) {
        let bytes = entry.serialize().unwrap();

        let (decoded, size) = IndexEntry::decode(&bytes).unwrap();

        assert_eq!(decoded, entry);
        assert_eq!(size, bytes.len());
    }

    #[rstest]
    fn name_filling_a_block_gets_a_full_block_of_padding(mut entry: IndexEntry) {
        // 62 + 2 = 64 bytes, the terminator forces another 8
        entry.name = "ab".to_string();

        assert_eq!(entry.serialize().unwrap().len(), 72);
    }

    #[rstest]
    fn stage_and_assume_valid_live_in_the_flags(mut entry: IndexEntry) {
        entry.stage = 2;
        entry.assume_valid = true;

        let bytes = entry.serialize().unwrap();
        assert_eq!(&bytes[60..62], &[0xA0, 0x0B]);

        let (decoded, _) = IndexEntry::decode(&bytes).unwrap();
        assert_eq!(decoded.stage, 2);
        assert!(decoded.assume_valid);
    }

    #[rstest]
    fn long_names_are_read_up_to_the_terminator(mut entry: IndexEntry) {
        entry.name = format!("deep/{}", "n".repeat(5000));

        let bytes = entry.serialize().unwrap();
        assert_eq!(&bytes[60..62], &[0x0F, 0xFF]);

        let (decoded, size) = IndexEntry::decode(&bytes).unwrap();
        assert_eq!(decoded.name, entry.name);
        assert_eq!(size, bytes.len());
    }

    #[rstest]
    fn extended_flag_is_rejected(entry: IndexEntry) {
        let mut bytes = entry.serialize().unwrap().to_vec();
        bytes[60] |= 0x40;

        assert!(malformed(IndexEntry::decode(&bytes).unwrap_err()));
    }

    #[rstest]
    fn nonzero_reserved_bits_are_rejected(entry: IndexEntry) {
        let mut bytes = entry.serialize().unwrap().to_vec();
        bytes[25] = 1;

        assert!(malformed(IndexEntry::decode(&bytes).unwrap_err()));
    }

    #[rstest]
    fn missing_terminator_is_rejected(entry: IndexEntry) {
        let mut bytes = entry.serialize().unwrap().to_vec();
        bytes[73] = b'x';

        assert!(malformed(IndexEntry::decode(&bytes).unwrap_err()));
    }

    #[rstest]
    fn symlink_mode_round_trips(mut entry: IndexEntry) {
        entry.metadata.mode = EntryMode::symlink();

        let (decoded, _) = IndexEntry::decode(&entry.serialize().unwrap()).unwrap();

        assert_eq!(decoded.metadata.mode.mode_type, ModeType::Symlink);
        assert_eq!(decoded.metadata.mode.as_tree_mode(), "120000");
    }

    #[rstest]
    fn parent_dirs_lists_every_ancestor(mut entry: IndexEntry) {
        entry.name = "a/b/c".to_string();

        assert_eq!(entry.parent_dirs(), vec!["a", "a/b"]);
        assert_eq!(entry.basename(), "c");
    }
}
