//! Index (staging area)
//!
//! The index tracks which files should be included in the next commit, along with the
//! stat metadata that lets porcelain detect changes without re-hashing content.
//!
//! ## Lifecycle
//!
//! The index is read once per command (`rehydrate`), mutated in memory and written
//! back wholesale (`write_updates`). Writes go to a fresh temporary file that is
//! renamed over `index`, so an interrupted write leaves the previous index intact.
//!
//! ## Data Structures
//!
//! - `entries`: Entries keyed by (path, stage), which is also their on-disk order
//! - `children`: Directory paths mapped to the tracked paths below them, used to
//!   discard file/directory conflicts

use crate::artifacts::index::checksum::{self, Checksum};
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{CHECKSUM_SIZE, HEADER_SIZE};
use crate::artifacts::objects::object::Packable;
use crate::errors::StoreError;
use anyhow::Context;
use fake::rand;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.git/index`)
    path: Box<Path>,
    entries: BTreeMap<(String, u8), IndexEntry>,
    children: BTreeMap<String, BTreeSet<String>>,
    /// Set when the in-memory entries differ from what was loaded
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.changed = false;
    }

    /// Load the index from disk; a missing index file is an empty index
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.clear();

        let contents = match std::fs::read(self.path()) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no index file yet");
                return Ok(());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("Unable to read index {}", self.path.display()));
            }
        };

        for entry in Self::decode(&contents)? {
            self.store_entry(entry);
        }

        tracing::debug!(entries = self.entries.len(), "loaded index");
        Ok(())
    }

    /// Parse an index file image
    ///
    /// Entries must be strictly ordered by (path, stage). Extensions after the last
    /// entry are skipped. The trailing checksum is verified when present; a partial
    /// one is rejected.
    pub fn decode(contents: &[u8]) -> anyhow::Result<Vec<IndexEntry>> {
        let header = IndexHeader::parse(contents)?;

        let mut entries: Vec<IndexEntry> = Vec::new();
        let mut offset = HEADER_SIZE;

        for position in 0..header.entries_count {
            let (entry, size) = IndexEntry::decode(&contents[offset..])
                .with_context(|| format!("Invalid index entry #{position} at byte {offset}"))?;

            if let Some(previous) = entries.last()
                && (previous.name.as_str(), previous.stage) >= (entry.name.as_str(), entry.stage)
            {
                return Err(StoreError::malformed(format!(
                    "index entry #{position} ({}, stage {}) is out of order or duplicated",
                    entry.name, entry.stage
                )));
            }

            entries.push(entry);
            offset += size;
        }

        match contents.len() - offset {
            0 => tracing::debug!("index has no checksum trailer"),
            remaining if remaining < CHECKSUM_SIZE => {
                return Err(StoreError::malformed(format!(
                    "index trailer is {remaining} bytes, shorter than its checksum"
                )));
            }
            _ => checksum::verify(contents)?,
        }

        Ok(entries)
    }

    /// Build the index file image: header, entries in (path, stage) order, checksum
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let mut writer = Checksum::new(Vec::new());

        let header = IndexHeader::new(self.entries.len() as u32);
        writer.write(&header.serialize()?)?;

        for entry in self.entries() {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()
    }

    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let contents = self.encode()?;

        let index_dir = self
            .path
            .parent()
            .with_context(|| format!("Invalid index path {}", self.path.display()))?;
        let temp_path = index_dir.join(format!("index-{}.tmp", rand::random::<u32>()));

        std::fs::write(&temp_path, &contents)
            .with_context(|| format!("Unable to write index file {}", temp_path.display()))?;
        std::fs::rename(&temp_path, self.path())
            .with_context(|| format!("Unable to replace index {}", self.path.display()))?;

        self.changed = false;
        tracing::debug!(entries = self.entries.len(), "wrote index");

        Ok(())
    }

    /// Stage `entry`, replacing the entry at the same (path, stage)
    ///
    /// A file replacing a directory drops every entry below that directory, and a
    /// file below a path tracked as a file drops that file.
    pub fn add(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry);
        self.store_entry(entry);
        self.changed = true;
    }

    /// Unstage `path` at every stage, together with everything below it
    pub fn remove(&mut self, path: &str) {
        self.remove_entry(path);
        self.remove_children(path);
        self.changed = true;
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The stage-0 entry for `path`
    pub fn entry_by_path(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(&(path.to_string(), 0))
    }

    pub fn is_tracked(&self, path: &str) -> bool {
        self.stages_of(path).next().is_some() || self.children.contains_key(path)
    }

    fn stages_of<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        self.entries
            .range((path.to_string(), 0)..=(path.to_string(), 3))
            .map(|(_, entry)| entry)
    }

    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.name);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_string())
                .or_default()
                .insert(entry.name.clone());
        }

        self.entries
            .insert((entry.name.clone(), entry.stage), entry);
    }

    fn remove_children(&mut self, path: &str) {
        if let Some(children) = self.children.remove(path) {
            for child in children {
                self.remove_entry(&child);
            }
        }
    }

    fn remove_entry(&mut self, path: &str) {
        let keys = self
            .stages_of(path)
            .map(|entry| (entry.name.clone(), entry.stage))
            .collect::<Vec<_>>();

        for key in keys {
            let Some(entry) = self.entries.remove(&key) else {
                continue;
            };

            for parent in entry.parent_dirs() {
                if let Some(children) = self.children.get_mut(parent) {
                    children.remove(path);
                    if children.is_empty() {
                        self.children.remove(parent);
                    }
                }
            }
        }
    }
}
