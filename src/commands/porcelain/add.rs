use crate::areas::repository::Repository;
use crate::artifacts::core::config::Config;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_type::ObjectType;
use std::path::Path;

impl Repository {
    /// Stage every file named by `paths`, expanding directories
    ///
    /// Ignored files are skipped when they come from a directory expansion but staged
    /// when named explicitly. A tracked path that no longer exists is unstaged.
    pub fn add(&self, config: &Config, paths: &[String]) -> anyhow::Result<()> {
        let ignores = self.read_ignores(config)?;

        let mut index = self.index();
        index.rehydrate()?;

        for path in paths {
            let name = self.workspace().relative_name(Path::new(path))?;

            let exists = std::fs::symlink_metadata(self.workspace().path().join(&name)).is_ok();
            if !exists && index.is_tracked(&name) {
                tracing::debug!(%name, "unstaging deleted path");
                index.remove(&name);
                continue;
            }

            let files = self.workspace().list_files(&name)?;
            let expanded = files.len() != 1 || files[0] != name;

            for file in files {
                if expanded && ignores.matches(&file)? {
                    tracing::debug!(%file, "skipping ignored file");
                    continue;
                }

                let data = self.workspace().read_file(&file)?;
                let stat = self.workspace().stat_file(&file)?;

                let oid = self.database().write(ObjectType::Blob, &data, true)?;
                index.add(IndexEntry::new(file, oid, stat));
            }
        }

        index.write_updates()?;

        Ok(())
    }
}
