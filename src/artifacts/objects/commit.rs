//! Commit and tag objects
//!
//! Both are KVLM blocks; they differ only in their type token and in which headers
//! carry meaning.
//!
//! ## Format
//!
//! ```text
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```
//!
//! An annotated tag points at another object through its `object` header.

use crate::artifacts::core::identity::Identity;
use crate::artifacts::objects::kvlm::Kvlm;
use crate::artifacts::objects::object::Packable;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::StoreError;
use bytes::Bytes;
use derive_new::new;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Commit {
    kvlm: Kvlm,
}

impl Commit {
    /// Build a new commit over `tree_oid`
    ///
    /// The message is stored as given, with a trailing newline appended when missing.
    pub fn create(
        tree_oid: &ObjectId,
        parent: Option<&ObjectId>,
        identity: &Identity,
        message: &str,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", tree_oid.as_ref());
        if let Some(parent) = parent {
            kvlm.push("parent", parent.as_ref());
        }
        kvlm.push("author", identity.display());
        kvlm.push("committer", identity.display());

        let mut message = message.trim_end().to_string();
        message.push('\n');
        kvlm.set_message(message);

        Commit { kvlm }
    }

    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    pub fn tree_oid(&self) -> anyhow::Result<ObjectId> {
        header_oid(&self.kvlm, "tree")
    }

    pub fn parents(&self) -> anyhow::Result<Vec<ObjectId>> {
        self.kvlm
            .get("parent")
            .unwrap_or_default()
            .iter()
            .map(|parent| ObjectId::try_parse(parent.clone()))
            .collect()
    }

    /// First line of the message
    pub fn short_message(&self) -> String {
        String::from_utf8_lossy(self.kvlm.message())
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        self.kvlm.serialize()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Tag {
    kvlm: Kvlm,
}

impl Tag {
    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    /// The object this tag points at
    pub fn target_oid(&self) -> anyhow::Result<ObjectId> {
        header_oid(&self.kvlm, "object")
    }
}

impl Packable for Tag {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        self.kvlm.serialize()
    }
}

fn header_oid(kvlm: &Kvlm, key: &str) -> anyhow::Result<ObjectId> {
    let value = kvlm
        .first(key)
        .ok_or_else(|| StoreError::malformed(format!("missing {key} header")))?;

    ObjectId::try_parse(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn identity() -> Identity {
        Identity::new_with_timestamp(
            "Ada Lovelace".to_string(),
            "ada@example.com".to_string(),
            chrono::DateTime::parse_from_rfc3339("2024-01-02T03:04:05+02:00").unwrap(),
        )
    }

    #[fixture]
    fn tree_oid() -> ObjectId {
        ObjectId::try_parse("4b825dc642cb6eb9a060e54bf8d69288fbee4904".to_string()).unwrap()
    }

    #[rstest]
    fn root_commit_has_no_parent_header(identity: Identity, tree_oid: ObjectId) {
        let commit = Commit::create(&tree_oid, None, &identity, "Initial commit");

        assert_eq!(
            commit.serialize().unwrap().as_ref(),
            concat!(
                "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n",
                "author Ada Lovelace <ada@example.com> 1704157445 +0200\n",
                "committer Ada Lovelace <ada@example.com> 1704157445 +0200\n",
                "\n",
                "Initial commit\n"
            )
            .as_bytes()
        );
        assert_eq!(commit.parents().unwrap(), Vec::<ObjectId>::new());
        assert_eq!(commit.tree_oid().unwrap(), tree_oid);
    }

    #[rstest]
    fn child_commit_records_its_parent(identity: Identity, tree_oid: ObjectId) {
        let parent = ObjectId::try_parse("a".repeat(40)).unwrap();
        let commit = Commit::create(&tree_oid, Some(&parent), &identity, "Second\n\nbody");

        assert_eq!(commit.parents().unwrap(), vec![parent]);
        assert_eq!(commit.short_message(), "Second");
    }

    #[test]
    fn tag_without_object_header_is_malformed() {
        let tag = Tag::new(Kvlm::parse(b"type commit\ntag v1\n\nrelease\n").unwrap());

        let error = tag.target_oid().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StoreError>(),
            Some(StoreError::MalformedData(_))
        ));
    }
}
