use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::core::config::Config;
use crate::artifacts::ignore::ignore_rule::IgnoreRule;
use crate::artifacts::ignore::ignores::Ignores;
use crate::artifacts::objects::object::GitObject;
use crate::errors::StoreError;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};

/// Name of the directory holding repository metadata
pub const GIT_DIR: &str = ".git";

const IGNORE_FILE_NAME: &str = ".gitignore";

pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    index: RefCell<Index>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    /// Open the repository whose working tree is `path`; nothing is created on disk
    pub fn new(path: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("Unable to create {}", path.display()))?;
        }
        let path = path.canonicalize()?;
        let git_path = path.join(GIT_DIR);

        Ok(Repository {
            index: RefCell::new(Index::new(git_path.join("index").into_boxed_path())),
            database: Database::new(git_path.join("objects").into_boxed_path()),
            workspace: Workspace::new(path.clone().into_boxed_path()),
            refs: Refs::new(git_path.into_boxed_path()),
            writer: RefCell::new(writer),
            path: path.into_boxed_path(),
        })
    }

    /// Open the repository containing `start`, searching parent directories for `.git`
    pub fn discover(start: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let start = start.canonicalize()?;

        let root = start
            .ancestors()
            .find(|candidate| candidate.join(GIT_DIR).is_dir())
            .map(PathBuf::from)
            .ok_or_else(|| {
                StoreError::not_found(format!(
                    "not a git repository (or any of the parent directories): {}",
                    start.display()
                ))
            })?;

        tracing::debug!(root = %root.display(), "found repository");
        Self::new(&root, writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_path(&self) -> PathBuf {
        self.path.join(GIT_DIR)
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&'_ self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Assemble every ignore rule that applies to this repository
    ///
    /// Absolute rules come from `info/exclude` and the user-wide excludes file.
    /// Scoped rules come from the `.gitignore` blobs staged in the index, keyed by
    /// the directory that holds them.
    pub fn read_ignores(&self, config: &Config) -> anyhow::Result<Ignores> {
        let mut ignores = Ignores::new();

        let exclude_files = [
            Some(self.git_path().join("info").join("exclude")),
            config.global_excludes.clone(),
        ];
        for exclude_file in exclude_files.into_iter().flatten() {
            if !exclude_file.is_file() {
                continue;
            }

            match std::fs::read_to_string(&exclude_file) {
                Ok(contents) => ignores.add_absolute(IgnoreRule::parse_lines(&contents)),
                Err(error) => tracing::warn!(
                    path = %exclude_file.display(),
                    %error,
                    "skipping unreadable exclude file"
                ),
            }
        }

        let mut index = self.index();
        index.rehydrate()?;

        for entry in index.entries() {
            if entry.basename() != IGNORE_FILE_NAME {
                continue;
            }

            let GitObject::Blob(blob) = self.database.read(&entry.oid)? else {
                return Err(StoreError::malformed(format!(
                    "{} is not a blob",
                    entry.name
                )));
            };

            let directory = entry.parent_dirs().last().copied().unwrap_or_default();
            let contents = String::from_utf8_lossy(blob.data());
            ignores.add_scoped(directory, IgnoreRule::parse_lines(&contents));
        }

        Ok(ignores)
    }
}
