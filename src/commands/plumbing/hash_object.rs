use crate::areas::repository::Repository;
use crate::artifacts::objects::object::GitObject;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::path::Path;

impl Repository {
    /// Print the ID of the file at `path` read as an `object_type` payload, storing it
    /// when `write` is set
    ///
    /// The payload is decoded first, so a malformed tree or commit is refused.
    pub fn hash_object(
        &self,
        path: &Path,
        object_type: ObjectType,
        write: bool,
    ) -> anyhow::Result<()> {
        let data = std::fs::read(path).with_context(|| format!("{} not found", path.display()))?;
        let object = GitObject::decode(object_type, Bytes::from(data))?;

        let object_id = if write {
            self.database().store(&object)?
        } else {
            self.database().hash(&object)?
        };

        writeln!(self.writer(), "{object_id}")?;

        Ok(())
    }
}
