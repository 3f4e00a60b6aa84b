use crate::areas::repository::Repository;
use crate::artifacts::core::config::Config;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::GitObject;
use crate::artifacts::objects::tree::Tree;

impl Repository {
    pub fn commit(&self, config: &Config, message: &str) -> anyhow::Result<()> {
        let identity = config.require_identity()?;

        let tree_oid = {
            let mut index = self.index();
            index.rehydrate()?;
            Tree::write_from_index(index.entries(), self.database())?
        };

        let parent = self.refs().read_head()?;
        let root_marker = match parent {
            Some(_) => "",
            None => " (root-commit)",
        };

        let commit = Commit::create(&tree_oid, parent.as_ref(), identity, message);
        let short_message = commit.short_message();
        let commit_oid = self.database().store(&GitObject::Commit(commit))?;
        self.refs().update_head(&commit_oid)?;

        let branch = self
            .refs()
            .active_branch()?
            .unwrap_or_else(|| "detached HEAD".to_string());

        writeln!(
            self.writer(),
            "[{branch}{root_marker} {}] {short_message}",
            commit_oid.to_short_oid()
        )?;

        Ok(())
    }
}
