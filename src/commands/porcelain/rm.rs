use crate::areas::repository::Repository;
use crate::errors::StoreError;
use std::path::Path;

impl Repository {
    /// Unstage `paths` and, unless `cached`, delete them from the working tree
    ///
    /// Nothing changes when any of the paths is untracked.
    pub fn rm(&self, paths: &[String], cached: bool) -> anyhow::Result<()> {
        let mut index = self.index();
        index.rehydrate()?;

        let names = paths
            .iter()
            .map(|path| self.workspace().relative_name(Path::new(path)))
            .collect::<anyhow::Result<Vec<_>>>()?;

        if let Some(untracked) = names.iter().find(|name| !index.is_tracked(name)) {
            return Err(StoreError::not_found(format!(
                "pathspec '{untracked}' did not match any files in the index"
            )));
        }

        for name in &names {
            let directory = format!("{name}/");
            let mut removed = index
                .entries()
                .filter(|entry| entry.name == *name || entry.name.starts_with(&directory))
                .map(|entry| entry.name.clone())
                .collect::<Vec<_>>();
            removed.dedup();

            index.remove(name);

            for file in removed {
                if !cached {
                    self.workspace().remove_file(&file)?;
                }
                writeln!(self.writer(), "rm '{file}'")?;
            }
        }

        index.write_updates()?;

        Ok(())
    }
}
