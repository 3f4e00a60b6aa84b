//! Loose object database
//!
//! Objects are zlib-compressed frames stored at `objects/<id[0:2]>/<id[2:]>`. Writes
//! go to a temporary file in the shard directory that is then renamed into place;
//! an object that already exists is never rewritten.

use crate::artifacts::objects::object::{self, GitObject, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::errors::StoreError;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Shortest abbreviation accepted for prefix lookups
pub const MIN_PREFIX_LENGTH: usize = 4;

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Frame and hash `payload`, persisting it when `persist` is set
    ///
    /// The returned ID is the same whether or not the object was written.
    pub fn write(
        &self,
        object_type: ObjectType,
        payload: &[u8],
        persist: bool,
    ) -> anyhow::Result<ObjectId> {
        let framed = object::frame(object_type, payload);
        let object_id = ObjectId::digest(&framed);

        if persist {
            let object_path = self.path.join(object_id.to_path());

            if object_path.exists() {
                tracing::debug!(oid = %object_id, "object already stored, skipping write");
            } else {
                self.write_object(&object_path, &framed)?;
                tracing::debug!(oid = %object_id, %object_type, size = payload.len(), "stored object");
            }
        }

        Ok(object_id)
    }

    pub fn store(&self, object: &GitObject) -> anyhow::Result<ObjectId> {
        self.write(object.object_type(), &object.serialize()?, true)
    }

    /// Compute the ID `object` would be stored under, without writing it
    pub fn hash(&self, object: &GitObject) -> anyhow::Result<ObjectId> {
        self.write(object.object_type(), &object.serialize()?, false)
    }

    pub fn exists(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).is_file()
    }

    pub fn read(&self, object_id: &ObjectId) -> anyhow::Result<GitObject> {
        let (object_type, payload) = self.read_raw(object_id)?;

        GitObject::decode(object_type, payload)
            .with_context(|| format!("Unable to decode {object_type} {object_id}"))
    }

    /// Load the type and payload of an object without decoding the payload
    pub fn read_raw(&self, object_id: &ObjectId) -> anyhow::Result<(ObjectType, Bytes)> {
        let object_path = self.path.join(object_id.to_path());

        let compressed = match std::fs::read(&object_path) {
            Ok(compressed) => compressed,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(format!("object {object_id}")));
            }
            Err(error) => {
                return Err(error).context(format!(
                    "Unable to read object file {}",
                    object_path.display()
                ));
            }
        };

        let framed = Self::decompress(&compressed)
            .with_context(|| format!("Unable to decompress object {object_id}"))?;

        object::unframe(framed).with_context(|| format!("Invalid object {object_id}"))
    }

    pub fn object_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        self.read_raw(object_id).map(|(object_type, _)| object_type)
    }

    fn write_object(&self, object_path: &Path, framed: &[u8]) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .with_context(|| format!("Invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(object_dir).with_context(|| {
            format!("Unable to create object directory {}", object_dir.display())
        })?;

        let temp_object_path = object_dir.join(Self::generate_temp_name());
        let compressed = Self::compress(framed)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .with_context(|| {
                format!("Unable to open object file {}", temp_object_path.display())
            })?;

        file.write_all(&compressed).with_context(|| {
            format!("Unable to write object file {}", temp_object_path.display())
        })?;

        // rename the temp file to the object file so readers never see a partial object
        std::fs::rename(&temp_object_path, object_path).with_context(|| {
            format!("Unable to rename object file to {}", object_path.display())
        })?;

        Ok(())
    }

    fn compress(data: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: &[u8]) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .map_err(|error| StoreError::malformed(format!("corrupt zlib stream: {error}")))?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }

    /// Find all objects whose ID starts with the given prefix
    ///
    /// The prefix must be 4 to 40 hex characters. Only the shard directory named by
    /// its first two characters is scanned. Matches are returned sorted; more than
    /// one match means the prefix is ambiguous.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        if !(MIN_PREFIX_LENGTH..=OBJECT_ID_LENGTH).contains(&prefix.len())
            || !prefix.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(StoreError::invalid_input(format!(
                "object prefix must be {MIN_PREFIX_LENGTH} to {OBJECT_ID_LENGTH} hex characters, got {prefix:?}"
            )));
        }

        let prefix = prefix.to_ascii_lowercase();
        let (dir_name, file_prefix) = prefix.split_at(2);
        let dir_path: PathBuf = self.path.join(dir_name);

        if !dir_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in std::fs::read_dir(&dir_path)? {
            let file_name = entry?.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with(file_prefix) {
                // temp files and strays fail to parse and are skipped
                if let Ok(oid) = ObjectId::try_parse(format!("{dir_name}{file_name}")) {
                    matches.push(oid);
                }
            }
        }
        matches.sort();

        tracing::debug!(%prefix, matches = matches.len(), "prefix lookup");
        Ok(matches)
    }
}
