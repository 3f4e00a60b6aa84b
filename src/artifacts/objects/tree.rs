//! Tree object
//!
//! Trees represent directory snapshots. They contain entries for files (blobs),
//! subdirectories (other trees), symlinks and submodule commits, along with their
//! names and modes.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`
//!
//! Modes are kept as 6-digit octal strings in memory. Directory modes are written
//! with 5 digits (`40000`), the way reference clients write them, and 5-digit modes
//! are padded back to 6 when read.
//!
//! ## Ordering
//!
//! Entries are emitted sorted by name, with directory entries compared as if their
//! name ended in `/`. This keeps `foo.txt` ahead of the directory `foo`.

use crate::areas::database::Database;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{GitObject, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::StoreError;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// Mode of a directory entry
pub const TREE_MODE: &str = "040000";

/// What a tree entry points at, keyed by the first two digits of its mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Tree,
    Blob,
    Symlink,
    CommitLink,
}

static ENTRY_KINDS: phf::Map<&'static str, EntryKind> = phf::phf_map! {
    "04" => EntryKind::Tree,
    "10" => EntryKind::Blob,
    "12" => EntryKind::Symlink,
    "16" => EntryKind::CommitLink,
};

impl EntryKind {
    pub fn from_mode(mode: &str) -> anyhow::Result<Self> {
        mode.get(..2)
            .and_then(|prefix| ENTRY_KINDS.get(prefix))
            .copied()
            .ok_or_else(|| StoreError::malformed(format!("unknown tree entry mode {mode}")))
    }

    /// Object type of the target; symlinks are stored as blobs
    pub fn object_type(&self) -> ObjectType {
        match self {
            EntryKind::Tree => ObjectType::Tree,
            EntryKind::Blob | EntryKind::Symlink => ObjectType::Blob,
            EntryKind::CommitLink => ObjectType::Commit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    mode: String,
    path: String,
    oid: ObjectId,
}

impl TreeEntry {
    pub fn new(mode: impl Into<String>, path: impl Into<String>, oid: ObjectId) -> Self {
        let mode = mode.into();
        let mode = if mode.len() == 5 {
            format!("0{mode}")
        } else {
            mode
        };

        TreeEntry {
            mode,
            path: path.into(),
            oid,
        }
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    pub fn kind(&self) -> anyhow::Result<EntryKind> {
        EntryKind::from_mode(&self.mode)
    }

    /// Name used for canonical ordering
    fn sort_key(&self) -> String {
        if self.mode.starts_with("04") {
            format!("{}/", self.path)
        } else {
            self.path.clone()
        }
    }

    fn write_to(&self, writer: &mut impl Write) -> anyhow::Result<()> {
        let mode = self.mode.strip_prefix('0').unwrap_or(&self.mode);

        write!(writer, "{} {}", mode, self.path)?;
        writer.write_all(&[0])?;
        self.oid.write_raw_to(writer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        Tree { entries }
    }

    /// Entries in the order they were decoded or supplied
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries
    }

    /// Entries in canonical on-disk order
    pub fn sorted_entries(&self) -> Vec<&TreeEntry> {
        let mut sorted = self.entries.iter().collect::<Vec<_>>();
        sorted.sort_by_cached_key(|entry| entry.sort_key());
        sorted
    }

    /// Build nested trees out of the stage-0 index entries and store them bottom-up
    ///
    /// Returns the ID of the root tree.
    pub fn write_from_index<'e>(
        entries: impl IntoIterator<Item = &'e IndexEntry>,
        database: &Database,
    ) -> anyhow::Result<ObjectId> {
        let mut root = DirectoryNode::default();

        for entry in entries.into_iter().filter(|entry| entry.stage == 0) {
            let components = entry.name.split('/').collect::<Vec<_>>();
            root.insert(&components, entry);
        }

        root.store(database)
    }
}

/// Scratch directory hierarchy used while turning a flat index into trees
#[derive(Debug, Default)]
struct DirectoryNode {
    files: Vec<TreeEntry>,
    directories: BTreeMap<String, DirectoryNode>,
}

impl DirectoryNode {
    fn insert(&mut self, components: &[&str], entry: &IndexEntry) {
        match components {
            [] => {}
            [file_name] => self.files.push(TreeEntry::new(
                entry.metadata.mode.as_tree_mode(),
                *file_name,
                entry.oid.clone(),
            )),
            [directory, rest @ ..] => self
                .directories
                .entry(directory.to_string())
                .or_default()
                .insert(rest, entry),
        }
    }

    fn store(self, database: &Database) -> anyhow::Result<ObjectId> {
        let mut entries = self.files;

        for (name, directory) in self.directories {
            let oid = directory.store(database)?;
            entries.push(TreeEntry::new(TREE_MODE, name, oid));
        }

        database.store(&GitObject::Tree(Tree::new(entries)))
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut bytes = Vec::new();

        for entry in self.sorted_entries() {
            entry.write_to(&mut bytes)?;
        }

        Ok(Bytes::from(bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = Vec::new();

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut path_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            if reader.read_until(b' ', &mut mode_bytes)? == 0 {
                break;
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(StoreError::malformed("truncated tree entry mode"));
            }

            let mode = std::str::from_utf8(&mode_bytes)
                .ok()
                .filter(|mode| matches!(mode.len(), 5 | 6))
                .filter(|mode| mode.bytes().all(|b| (b'0'..=b'7').contains(&b)))
                .ok_or_else(|| {
                    StoreError::malformed(format!(
                        "invalid tree entry mode {}",
                        String::from_utf8_lossy(&mode_bytes)
                    ))
                })?;

            path_bytes.clear();
            reader.read_until(0, &mut path_bytes)?;
            if path_bytes.pop() != Some(0) {
                return Err(StoreError::malformed("truncated tree entry path"));
            }
            let path = std::str::from_utf8(&path_bytes)
                .map_err(|_| StoreError::malformed("tree entry path is not valid UTF-8"))?;

            let oid = ObjectId::read_raw_from(&mut reader)?;

            let entry = TreeEntry::new(mode, path, oid);
            entry.kind()?;
            entries.push(entry);
        }

        Ok(Tree { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn oid(fill: char) -> ObjectId {
        ObjectId::try_parse(fill.to_string().repeat(40)).unwrap()
    }

    fn decode(bytes: &[u8]) -> anyhow::Result<Tree> {
        Tree::deserialize(std::io::Cursor::new(bytes))
    }

    #[test]
    fn directory_sorts_after_its_prefix_sibling_file() {
        let tree = Tree::new(vec![
            TreeEntry::new(TREE_MODE, "foo", oid('a')),
            TreeEntry::new("100644", "foo.txt", oid('b')),
            TreeEntry::new("100644", "bar", oid('c')),
        ]);

        let paths = tree
            .sorted_entries()
            .into_iter()
            .map(TreeEntry::path)
            .collect::<Vec<_>>();

        assert_eq!(paths, vec!["bar", "foo.txt", "foo"]);
    }

    #[test]
    fn encoding_leaves_the_callers_order_alone() {
        let tree = Tree::new(vec![
            TreeEntry::new("100644", "z", oid('a')),
            TreeEntry::new("100644", "a", oid('b')),
        ]);

        tree.serialize().unwrap();

        assert_eq!(tree.entries()[0].path(), "z");
    }

    #[test]
    fn directory_mode_is_written_with_five_digits_and_read_back_as_six() {
        let tree = Tree::new(vec![TreeEntry::new(TREE_MODE, "src", oid('a'))]);

        let bytes = tree.serialize().unwrap();
        assert!(bytes.starts_with(b"40000 src\0"));
        assert_eq!(bytes.len(), "40000 src\0".len() + 20);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.entries()[0].mode(), "040000");
        assert_eq!(decoded.entries()[0].kind().unwrap(), EntryKind::Tree);
    }

    #[rstest]
    #[case("040000", EntryKind::Tree, ObjectType::Tree)]
    #[case("100644", EntryKind::Blob, ObjectType::Blob)]
    #[case("100755", EntryKind::Blob, ObjectType::Blob)]
    #[case("120000", EntryKind::Symlink, ObjectType::Blob)]
    #[case("160000", EntryKind::CommitLink, ObjectType::Commit)]
    fn mode_prefix_determines_kind(
        #[case] mode: &str,
        #[case] kind: EntryKind,
        #[case] object_type: ObjectType,
    ) {
        assert_eq!(EntryKind::from_mode(mode).unwrap(), kind);
        assert_eq!(kind.object_type(), object_type);
    }

    #[rstest]
    #[case::truncated_hash(&b"100644 a.txt\0\x01\x02"[..])]
    #[case::missing_nul(&b"100644 a.txt"[..])]
    #[case::missing_space(&b"100644"[..])]
    #[case::bad_mode_length(&b"1006440 a\0aaaaaaaaaaaaaaaaaaaa"[..])]
    #[case::unknown_mode(&b"070000 a\0aaaaaaaaaaaaaaaaaaaa"[..])]
    fn truncated_or_invalid_entries_are_malformed(#[case] bytes: &[u8]) {
        let error = decode(bytes).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<StoreError>(),
            Some(StoreError::MalformedData(_))
        ));
    }

    #[test]
    fn empty_payload_is_an_empty_tree() {
        assert_eq!(decode(b"").unwrap(), Tree::default());
    }

    fn arb_entries() -> impl Strategy<Value = Vec<TreeEntry>> {
        proptest::collection::btree_map(
            "[a-z0-9._-]{1,8}",
            (
                prop_oneof![
                    Just("040000"),
                    Just("100644"),
                    Just("100755"),
                    Just("120000"),
                    Just("160000"),
                ],
                proptest::array::uniform20(any::<u8>()),
            ),
            0..12,
        )
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(path, (mode, raw))| TreeEntry::new(mode, path, ObjectId::from_raw(&raw)))
                .collect()
        })
        .prop_shuffle()
    }

    proptest! {
        #[test]
        fn decoding_yields_the_canonically_sorted_entries(entries in arb_entries()) {
            let tree = Tree::new(entries);
            let encoded = tree.serialize().unwrap();
            let decoded = decode(&encoded).unwrap();

            let expected = tree.sorted_entries().into_iter().cloned().collect::<Vec<_>>();
            prop_assert_eq!(decoded.entries(), expected.as_slice());
            prop_assert_eq!(decoded.serialize().unwrap(), encoded);
        }
    }
}
