use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;
use crate::artifacts::objects::object::GitObject;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::EntryKind;
use crate::errors::StoreError;
use anyhow::Context;
use std::path::Path;

impl Repository {
    /// Materialize the tree of `name` inside `target`, which must be empty or absent
    pub fn checkout(&self, name: &str, target: &Path) -> anyhow::Result<()> {
        let tree_oid = self
            .refs()
            .find(self.database(), name, Some(ObjectType::Tree))?;

        if target.exists() {
            if !target.is_dir() {
                return Err(StoreError::invalid_input(format!(
                    "not a directory: {}",
                    target.display()
                )));
            }
            if std::fs::read_dir(target)?.next().is_some() {
                return Err(StoreError::invalid_input(format!(
                    "not empty: {}",
                    target.display()
                )));
            }
        } else {
            std::fs::create_dir_all(target)
                .with_context(|| format!("Unable to create {}", target.display()))?;
        }

        self.checkout_tree(&tree_oid, target, "")
    }

    fn checkout_tree(&self, oid: &ObjectId, root: &Path, prefix: &str) -> anyhow::Result<()> {
        let GitObject::Tree(tree) = self.database().read(oid)? else {
            return Err(StoreError::malformed(format!("{oid} is not a tree")));
        };

        for entry in tree.entries() {
            let name = if prefix.is_empty() {
                entry.path().to_string()
            } else {
                format!("{prefix}/{}", entry.path())
            };

            match entry.kind()? {
                EntryKind::Tree => {
                    std::fs::create_dir_all(root.join(&name))?;
                    self.checkout_tree(entry.oid(), root, &name)?;
                }
                EntryKind::Blob | EntryKind::Symlink => {
                    let (_, data) = self.database().read_raw(entry.oid())?;
                    Workspace::write_file(root, &name, &data, entry.mode())?;
                }
                // Submodule contents live in another repository
                EntryKind::CommitLink => {
                    std::fs::create_dir_all(root.join(&name))?;
                }
            }
        }

        Ok(())
    }
}
