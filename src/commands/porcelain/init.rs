use crate::areas::refs::DEFAULT_BRANCH;
use crate::areas::repository::Repository;
use crate::errors::StoreError;
use anyhow::Context;
use std::fs;

const DESCRIPTION: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";

const DEFAULT_CONFIG: &str = "[core]\n\
    \trepositoryformatversion = 0\n\
    \tfilemode = false\n\
    \tbare = false\n";

impl Repository {
    pub fn init(&self) -> anyhow::Result<()> {
        let git_path = self.git_path();

        if git_path.is_dir() && fs::read_dir(&git_path)?.next().is_some() {
            return Err(StoreError::invalid_input(format!(
                "{} is not empty",
                git_path.display()
            )));
        }

        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .git/objects directory")?;

        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create .git/refs/heads directory")?;

        fs::create_dir_all(self.refs().tags_path())
            .context("Failed to create .git/refs/tags directory")?;

        fs::create_dir_all(git_path.join("info"))
            .context("Failed to create .git/info directory")?;

        fs::write(git_path.join("description"), DESCRIPTION)
            .context("Failed to create .git/description")?;
        fs::write(git_path.join("config"), DEFAULT_CONFIG)
            .context("Failed to create .git/config")?;

        self.refs()
            .set_head_to_branch(DEFAULT_BRANCH)
            .context("Failed to create initial HEAD reference")?;

        writeln!(
            self.writer(),
            "Initialized empty Git repository in {}",
            git_path.display()
        )?;

        Ok(())
    }
}
