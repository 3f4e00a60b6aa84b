//! References (HEAD, branches, tags, remotes)
//!
//! References are human-readable names pointing to objects. A reference file holds
//! either:
//! - A 40-character SHA-1 hash (direct reference)
//! - `ref: <path>` for symbolic references, e.g. HEAD -> refs/heads/master
//!
//! An empty reference file stands for an unborn branch. Symbolic chains are followed
//! with a visited set, so a cycle is reported instead of recursing forever.
//!
//! A reference with no loose file falls back to `packed-refs`, and a loose file
//! shadows the packed entry of the same name.
//!
//! ## Name resolution
//!
//! A user-supplied name is turned into candidate object IDs by looking, in order, at
//! the object database (for 4 to 40 hex characters), `refs/tags/`, `refs/heads/` and
//! `refs/remotes/`. Exactly one candidate must remain.

use crate::areas::database::Database;
use crate::artifacts::objects::object::GitObject;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::StoreError;
use anyhow::Context;
use derive_new::new;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Default branch of a freshly initialized repository
pub const DEFAULT_BRANCH: &str = "master";

const SYMREF_PREFIX: &str = "ref: ";

/// Regex pattern for names that may be abbreviated object IDs
const OID_PREFIX_REGEX: &str = r"^[0-9A-Fa-f]{4,40}$";

static OID_PREFIX: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(OID_PREFIX_REGEX));

/// File holding references packed by `git pack-refs`, one `<oid> <name>` per line
const PACKED_REFS_FILE: &str = "packed-refs";

/// Namespaces searched for a short reference name, in priority order
const SEARCH_NAMESPACES: [&str; 3] = ["refs/tags", "refs/heads", "refs/remotes"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum RefValue {
    Symbolic(String),
    Direct(ObjectId),
}

impl RefValue {
    /// Read a reference file; a missing file, a directory or an empty file yield `None`
    fn read(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ref file at {}", path.display()))?;
        let content = content.trim_end_matches(['\n', '\r']);

        if content.is_empty() {
            return Ok(None);
        }

        match content.strip_prefix(SYMREF_PREFIX) {
            Some(target) => Ok(Some(RefValue::Symbolic(target.trim().to_string()))),
            None => ObjectId::try_parse(content.trim().to_string())
                .with_context(|| format!("invalid ref file at {}", path.display()))
                .map(|oid| Some(RefValue::Direct(oid))),
        }
    }
}

/// Reference manager rooted at the repository's git directory
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the git directory (typically `.git`)
    path: Box<Path>,
}

impl Refs {
    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    pub fn heads_path(&self) -> PathBuf {
        self.refs_path().join("heads")
    }

    pub fn tags_path(&self) -> PathBuf {
        self.refs_path().join("tags")
    }

    /// Resolve a reference, given relative to the git directory, to an object ID
    ///
    /// Symbolic references are followed. A reference with no loose file is looked up
    /// in `packed-refs`. `None` means the reference does not exist or is unborn.
    pub fn resolve(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        let mut visited = HashSet::new();
        let mut current = name.to_string();

        loop {
            if !visited.insert(current.clone()) {
                return Err(StoreError::malformed(format!(
                    "symbolic reference cycle through {current}"
                )));
            }

            match RefValue::read(&self.path.join(&current))? {
                Some(RefValue::Symbolic(target)) => {
                    tracing::debug!(from = %current, to = %target, "following symbolic ref");
                    current = target;
                }
                Some(RefValue::Direct(oid)) => return Ok(Some(oid)),
                None if self.path.join(&current).exists() => return Ok(None),
                None => return Ok(self.packed_refs()?.remove(&current)),
            }
        }
    }

    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.resolve(HEAD_REF_NAME)
    }

    /// Collect every object ID `name` could refer to
    ///
    /// Duplicates are kept: a branch named like an abbreviation of its own tip
    /// still counts twice.
    pub fn candidates(&self, database: &Database, name: &str) -> anyhow::Result<Vec<ObjectId>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::invalid_input("a reference name must be supplied"));
        }

        if name == HEAD_REF_NAME {
            return Ok(self.read_head()?.into_iter().collect());
        }

        let mut candidates = Vec::new();

        let oid_prefix = OID_PREFIX.as_ref().map_err(Clone::clone)?;
        if oid_prefix.is_match(name) {
            candidates.extend(database.find_objects_by_prefix(name)?);
        }

        for namespace in SEARCH_NAMESPACES {
            if let Some(oid) = self.resolve(&format!("{namespace}/{name}"))? {
                candidates.push(oid);
            }
        }

        tracing::debug!(%name, candidates = candidates.len(), "resolved reference candidates");
        Ok(candidates)
    }

    /// Resolve `name` to a single object, dereferencing it to `want` when given
    ///
    /// Tags are followed through their `object` header. A commit only turns into
    /// its tree, and only when a tree is wanted.
    pub fn find(
        &self,
        database: &Database,
        name: &str,
        want: Option<ObjectType>,
    ) -> anyhow::Result<ObjectId> {
        let mut candidates = self.candidates(database, name)?;

        let mut oid = match candidates.len() {
            0 => return Err(StoreError::not_found(format!("no such reference {name}"))),
            1 => candidates.remove(0),
            _ => {
                return Err(StoreError::Ambiguous {
                    name: name.to_string(),
                    candidates,
                }
                .into());
            }
        };

        let Some(want) = want else {
            return Ok(oid);
        };

        loop {
            let object = database.read(&oid)?;
            if object.object_type() == want {
                return Ok(oid);
            }

            oid = match &object {
                GitObject::Tag(tag) => tag.target_oid()?,
                GitObject::Commit(commit) if want == ObjectType::Tree => commit.tree_oid()?,
                _ => {
                    return Err(StoreError::invalid_input(format!(
                        "{name} is a {}, which cannot be turned into a {want}",
                        object.object_type()
                    )));
                }
            };
            tracing::debug!(%name, next = %oid, "dereferenced object");
        }
    }

    /// Every reference under `refs/` with the object it resolves to, sorted by name
    ///
    /// Loose references shadow packed ones of the same name. Unborn references are
    /// left out.
    pub fn list(&self) -> anyhow::Result<Vec<(String, ObjectId)>> {
        let mut refs = self.packed_refs()?;

        let refs_path = self.refs_path();
        if refs_path.is_dir() {
            for entry in WalkDir::new(&refs_path) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }

                let name = entry
                    .path()
                    .strip_prefix(&self.path)?
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                match self.resolve(&name)? {
                    Some(oid) => refs.insert(name, oid),
                    None => refs.remove(&name),
                };
            }
        }

        Ok(refs.into_iter().collect())
    }

    /// References recorded in `packed-refs`; a missing file holds none
    ///
    /// Comment lines and `^` peeled-tag lines are skipped.
    fn packed_refs(&self) -> anyhow::Result<BTreeMap<String, ObjectId>> {
        let path = self.path.join(PACKED_REFS_FILE);
        if !path.is_file() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let mut refs = BTreeMap::new();
        for line in content.lines().map(str::trim_end) {
            if line.is_empty() || line.starts_with('#') || line.starts_with('^') {
                continue;
            }

            let (oid, name) = line.split_once(' ').ok_or_else(|| {
                StoreError::malformed(format!("invalid packed-refs line: {line}"))
            })?;
            let oid = ObjectId::try_parse(oid.to_string()).map_err(|_| {
                StoreError::malformed(format!("invalid object id in packed-refs line: {line}"))
            })?;

            refs.insert(name.to_string(), oid);
        }

        Ok(refs)
    }

    /// Branch HEAD points at, or `None` when HEAD is detached
    pub fn active_branch(&self) -> anyhow::Result<Option<String>> {
        Ok(match RefValue::read(&self.head_path())? {
            Some(RefValue::Symbolic(target)) => target
                .strip_prefix("refs/heads/")
                .map(|branch| branch.to_string()),
            _ => None,
        })
    }

    /// Point HEAD at `branch` symbolically, whether or not the branch exists yet
    pub fn set_head_to_branch(&self, branch: &str) -> anyhow::Result<()> {
        self.write_ref_file(
            &self.head_path(),
            &format!("{SYMREF_PREFIX}refs/heads/{branch}\n"),
        )
    }

    /// Detach HEAD at `oid`
    pub fn detach_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(&self.head_path(), &format!("{oid}\n"))
    }

    /// Move whatever HEAD points at to `oid`
    ///
    /// With a symbolic HEAD the branch at the end of the chain moves; a detached
    /// HEAD is overwritten.
    pub fn update_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        let mut visited = HashSet::new();
        let mut current = HEAD_REF_NAME.to_string();

        while let Some(RefValue::Symbolic(target)) = RefValue::read(&self.path.join(&current))? {
            if !visited.insert(current.clone()) {
                return Err(StoreError::malformed(format!(
                    "symbolic reference cycle through {current}"
                )));
            }
            current = target;
        }

        tracing::debug!(reference = %current, %oid, "updating reference");
        self.write_ref_file(&self.path.join(&current), &format!("{oid}\n"))
    }

    /// Create or overwrite `refs/<namespace>/<name>` with a direct reference
    pub fn update_ref(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(&self.path.join(name), &format!("{oid}\n"))
    }

    fn write_ref_file(&self, path: &Path, content: &str) -> anyhow::Result<()> {
        // create all the parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create parent directories for {}", path.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("failed to write ref file at {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::commit::{Commit, Tag};
    use crate::artifacts::objects::kvlm::Kvlm;
    use crate::artifacts::objects::tree::Tree;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    struct Fixture {
        _dir: TempDir,
        refs: Refs,
        database: Database,
    }

    #[fixture]
    fn repo() -> Fixture {
        let dir = TempDir::new().unwrap();
        let git_dir = dir.path().join(".git");
        std::fs::create_dir_all(git_dir.join("refs/heads")).unwrap();

        Fixture {
            refs: Refs::new(git_dir.clone().into_boxed_path()),
            database: Database::new(git_dir.join("objects").into_boxed_path()),
            _dir: dir,
        }
    }

    fn oid(fill: char) -> ObjectId {
        ObjectId::try_parse(fill.to_string().repeat(40)).unwrap()
    }

    fn kind(error: &anyhow::Error) -> Option<&StoreError> {
        error.downcast_ref::<StoreError>()
    }

    #[rstest]
    fn symbolic_head_resolves_through_the_branch(repo: Fixture) {
        repo.refs.set_head_to_branch("master").unwrap();
        repo.refs.update_ref("refs/heads/master", &oid('a')).unwrap();

        assert_eq!(repo.refs.read_head().unwrap(), Some(oid('a')));
        assert_eq!(repo.refs.active_branch().unwrap(), Some("master".to_string()));
    }

    #[rstest]
    fn unborn_and_empty_refs_resolve_to_none(repo: Fixture) {
        repo.refs.set_head_to_branch("master").unwrap();
        assert_eq!(repo.refs.read_head().unwrap(), None);

        std::fs::write(repo.refs.heads_path().join("master"), "").unwrap();
        assert_eq!(repo.refs.read_head().unwrap(), None);
    }

    #[rstest]
    fn symbolic_cycles_are_malformed(repo: Fixture) {
        std::fs::write(repo.refs.heads_path().join("a"), "ref: refs/heads/b\n").unwrap();
        std::fs::write(repo.refs.heads_path().join("b"), "ref: refs/heads/a\n").unwrap();

        let error = repo.refs.resolve("refs/heads/a").unwrap_err();

        assert!(matches!(kind(&error), Some(StoreError::MalformedData(_))));
    }

    #[rstest]
    fn update_head_moves_the_active_branch(repo: Fixture) {
        repo.refs.set_head_to_branch("main").unwrap();

        repo.refs.update_head(&oid('b')).unwrap();

        assert_eq!(repo.refs.resolve("refs/heads/main").unwrap(), Some(oid('b')));
        assert_eq!(repo.refs.active_branch().unwrap(), Some("main".to_string()));
    }

    #[rstest]
    fn update_head_overwrites_a_detached_head(repo: Fixture) {
        repo.refs.detach_head(&oid('a')).unwrap();

        repo.refs.update_head(&oid('c')).unwrap();

        assert_eq!(repo.refs.read_head().unwrap(), Some(oid('c')));
        assert_eq!(repo.refs.active_branch().unwrap(), None);
    }

    #[rstest]
    fn abbreviated_hash_resolves_to_the_full_id(repo: Fixture) {
        let blob = repo
            .database
            .write(ObjectType::Blob, b"abbreviate me", true)
            .unwrap();

        let found = repo.refs.find(&repo.database, &blob.as_ref()[..6], None).unwrap();

        assert_eq!(found, blob);
    }

    #[rstest]
    fn shared_prefix_is_ambiguous(repo: Fixture) {
        let shard = repo.database.objects_path().join("ab");
        std::fs::create_dir_all(&shard).unwrap();
        std::fs::write(shard.join(format!("cd{}", "1".repeat(36))), b"").unwrap();
        std::fs::write(shard.join(format!("cd{}", "2".repeat(36))), b"").unwrap();

        let error = repo.refs.find(&repo.database, "abcd", None).unwrap_err();

        match kind(&error) {
            Some(StoreError::Ambiguous { name, candidates }) => {
                assert_eq!(name, "abcd");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected an ambiguous reference, got {other:?}"),
        }
    }

    #[rstest]
    fn unknown_name_is_not_found(repo: Fixture) {
        let error = repo.refs.find(&repo.database, "nope", None).unwrap_err();

        assert!(matches!(kind(&error), Some(StoreError::NotFound(_))));
    }

    #[rstest]
    fn tag_dereferences_through_commit_to_tree(repo: Fixture) {
        let database = &repo.database;
        let tree = database.store(&GitObject::Tree(Tree::default())).unwrap();

        let mut commit = Kvlm::new();
        commit.push("tree", tree.as_ref());
        commit.set_message("snapshot\n");
        let commit = database
            .store(&GitObject::Commit(Commit::new(commit)))
            .unwrap();

        let mut tag = Kvlm::new();
        tag.push("object", commit.as_ref());
        tag.push("type", "commit");
        tag.push("tag", "v1");
        tag.set_message("release\n");
        let tag = database.store(&GitObject::Tag(Tag::new(tag))).unwrap();
        repo.refs.update_ref("refs/tags/v1", &tag).unwrap();

        assert_eq!(
            repo.refs.find(database, "v1", Some(ObjectType::Tree)).unwrap(),
            tree
        );
        assert_eq!(
            repo.refs
                .find(database, "v1", Some(ObjectType::Commit))
                .unwrap(),
            commit
        );
        assert_eq!(repo.refs.find(database, "v1", None).unwrap(), tag);
    }

    #[rstest]
    fn tree_cannot_become_a_commit(repo: Fixture) {
        let tree = repo
            .database
            .store(&GitObject::Tree(Tree::default()))
            .unwrap();
        repo.refs.update_ref("refs/heads/odd", &tree).unwrap();

        let error = repo
            .refs
            .find(&repo.database, "odd", Some(ObjectType::Commit))
            .unwrap_err();

        assert!(matches!(kind(&error), Some(StoreError::InvalidInput(_))));
    }

    #[rstest]
    fn list_walks_every_namespace_in_order(repo: Fixture) {
        repo.refs.update_ref("refs/tags/v1", &oid('1')).unwrap();
        repo.refs.update_ref("refs/heads/main", &oid('2')).unwrap();
        repo.refs.update_ref("refs/heads/feature/x", &oid('3')).unwrap();
        std::fs::write(repo.refs.heads_path().join("unborn"), "").unwrap();

        let names = repo
            .refs
            .list()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();

        assert_eq!(
            names,
            vec!["refs/heads/feature/x", "refs/heads/main", "refs/tags/v1"]
        );
    }

    fn write_packed_refs(repo: &Fixture, content: &str) {
        std::fs::write(repo.refs.path.join(PACKED_REFS_FILE), content).unwrap();
    }

    #[rstest]
    fn packed_refs_resolve_when_no_loose_file_exists(repo: Fixture) {
        write_packed_refs(
            &repo,
            &format!(
                "# pack-refs with: peeled fully-peeled sorted\n{} refs/heads/master\n{} refs/tags/v1\n^{}\n",
                oid('a'),
                oid('b'),
                oid('c')
            ),
        );
        repo.refs.set_head_to_branch("master").unwrap();

        assert_eq!(repo.refs.read_head().unwrap(), Some(oid('a')));
        assert_eq!(repo.refs.resolve("refs/tags/v1").unwrap(), Some(oid('b')));
        assert_eq!(repo.refs.resolve("refs/tags/v2").unwrap(), None);
    }

    #[rstest]
    fn loose_refs_shadow_packed_ones_in_listings(repo: Fixture) {
        write_packed_refs(
            &repo,
            &format!("{} refs/heads/master\n{} refs/tags/v1\n", oid('a'), oid('b')),
        );
        repo.refs.update_ref("refs/heads/master", &oid('d')).unwrap();

        assert_eq!(repo.refs.resolve("refs/heads/master").unwrap(), Some(oid('d')));
        assert_eq!(
            repo.refs.list().unwrap(),
            vec![
                ("refs/heads/master".to_string(), oid('d')),
                ("refs/tags/v1".to_string(), oid('b')),
            ]
        );
    }

    #[rstest]
    fn garbage_in_packed_refs_is_malformed(repo: Fixture) {
        write_packed_refs(&repo, "not-a-hash refs/heads/master\n");

        let error = repo.refs.resolve("refs/heads/master").unwrap_err();

        assert!(matches!(kind(&error), Some(StoreError::MalformedData(_))));
    }
}
