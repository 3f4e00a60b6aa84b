use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::EntryMetadata;
use anyhow::Context;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 1] = [".git"];

/// The working tree
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn a path given on the command line into a repository-relative, `/`-separated
    /// name
    pub fn relative_name(&self, path: &Path) -> anyhow::Result<String> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let absolute = normalize(&absolute);

        let relative = absolute.strip_prefix(&self.path).with_context(|| {
            format!(
                "{} is outside the repository at {}",
                path.display(),
                self.path.display()
            )
        })?;

        Ok(relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }

    /// Every file below `name` (or `name` itself when it is a file), as repository-relative
    /// names in sorted order; `.git` is skipped
    pub fn list_files(&self, name: &str) -> anyhow::Result<Vec<String>> {
        let root = self.path.join(name);

        let metadata = std::fs::symlink_metadata(&root)
            .with_context(|| format!("The specified path does not exist: {name}"))?;
        if !metadata.is_dir() {
            return Ok(vec![name.to_string()]);
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry.file_name().to_string_lossy().as_ref()));

        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }

            let relative = entry.path().strip_prefix(&self.path)?;
            files.push(
                relative
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/"),
            );
        }

        Ok(files)
    }

    fn is_ignored(file_name: &str) -> bool {
        IGNORED_PATHS.contains(&file_name)
    }

    /// File content, or the link target for a symlink
    pub fn read_file(&self, name: &str) -> anyhow::Result<Bytes> {
        let file_path = self.path.join(name);

        if std::fs::symlink_metadata(&file_path)?.file_type().is_symlink() {
            let target = std::fs::read_link(&file_path)?;
            return Ok(Bytes::from(target.to_string_lossy().into_owned()));
        }

        std::fs::read(&file_path)
            .map(Bytes::from)
            .with_context(|| format!("Unable to read {name}"))
    }

    pub fn stat_file(&self, name: &str) -> anyhow::Result<EntryMetadata> {
        let file_path = self.path.join(name);
        let metadata = std::fs::symlink_metadata(&file_path)
            .with_context(|| format!("Unable to stat {name}"))?;

        Ok(EntryMetadata::from_stat(&file_path, &metadata))
    }

    /// Write a checked-out blob below `root`, which need not be the working tree
    pub fn write_file(root: &Path, name: &str, data: &[u8], mode: &str) -> anyhow::Result<()> {
        let file_path = root.join(name);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if mode.starts_with("12") {
            let target = String::from_utf8_lossy(data).into_owned();
            std::os::unix::fs::symlink(target, &file_path)
                .with_context(|| format!("Failed to create symlink: {name}"))?;
            return Ok(());
        }

        std::fs::write(&file_path, data).with_context(|| format!("Failed to write file: {name}"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = if EntryMode::regular(true).as_tree_mode() == mode {
                0o755
            } else {
                0o644
            };
            std::fs::set_permissions(&file_path, std::fs::Permissions::from_mode(permissions))
                .with_context(|| format!("Failed to set permissions for file: {name}"))?;
        }

        Ok(())
    }

    pub fn remove_file(&self, name: &str) -> anyhow::Result<()> {
        let file_path = self.path.join(name);
        if std::fs::symlink_metadata(&file_path).is_ok() {
            std::fs::remove_file(&file_path)
                .with_context(|| format!("Failed to remove file: {name}"))?;
        }

        Ok(())
    }
}

/// Resolve `.` and `..` lexically, without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    normalized
}
