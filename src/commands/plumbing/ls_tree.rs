use crate::areas::repository::Repository;
use crate::artifacts::objects::object::GitObject;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::EntryKind;
use crate::errors::StoreError;

impl Repository {
    pub fn ls_tree(&self, name: &str, recursive: bool) -> anyhow::Result<()> {
        let oid = self
            .refs()
            .find(self.database(), name, Some(ObjectType::Tree))?;

        self.list_tree(&oid, "", recursive)
    }

    fn list_tree(&self, oid: &ObjectId, prefix: &str, recursive: bool) -> anyhow::Result<()> {
        let GitObject::Tree(tree) = self.database().read(oid)? else {
            return Err(StoreError::malformed(format!("{oid} is not a tree")));
        };

        for entry in tree.entries() {
            let path = if prefix.is_empty() {
                entry.path().to_string()
            } else {
                format!("{prefix}/{}", entry.path())
            };
            let kind = entry.kind()?;

            if recursive && kind == EntryKind::Tree {
                self.list_tree(entry.oid(), &path, recursive)?;
            } else {
                writeln!(
                    self.writer(),
                    "{} {} {}\t{}",
                    entry.mode(),
                    kind.object_type(),
                    entry.oid(),
                    path
                )?;
            }
        }

        Ok(())
    }
}
