use crate::areas::repository::Repository;
use crate::artifacts::core::config::Config;
use std::path::Path;

impl Repository {
    /// Print each of `paths` that is ignored, with the deciding pattern when `verbose`
    pub fn check_ignore(
        &self,
        config: &Config,
        paths: &[String],
        verbose: bool,
    ) -> anyhow::Result<()> {
        let ignores = self.read_ignores(config)?;

        for path in paths {
            let name = self.workspace().relative_name(Path::new(path))?;
            let name = if path.ends_with('/') {
                format!("{name}/")
            } else {
                name
            };

            match ignores.matching_rule(&name)? {
                Some(rule) if rule.exclude() => {
                    if verbose {
                        writeln!(self.writer(), "{}\t{path}", rule.pattern())?;
                    } else {
                        writeln!(self.writer(), "{path}")?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}
