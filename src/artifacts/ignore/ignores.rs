use crate::artifacts::ignore::ignore_rule::IgnoreRule;
use crate::errors::StoreError;
use std::collections::HashMap;

/// Every ignore rule that applies to a repository
///
/// `absolute` rules come from the exclude files and apply everywhere. `scoped` rules
/// come from tracked `.gitignore` files and are keyed by the directory holding the
/// file (`""` for the repository root).
#[derive(Debug, Clone, Default)]
pub struct Ignores {
    absolute: Vec<IgnoreRule>,
    scoped: HashMap<String, Vec<IgnoreRule>>,
}

impl Ignores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_absolute(&mut self, rules: impl IntoIterator<Item = IgnoreRule>) {
        self.absolute.extend(rules);
    }

    pub fn add_scoped(&mut self, directory: impl Into<String>, rules: Vec<IgnoreRule>) {
        self.scoped.entry(directory.into()).or_default().extend(rules);
    }

    /// Whether `path`, relative to the repository root, is ignored
    pub fn matches(&self, path: &str) -> anyhow::Result<bool> {
        Ok(self.matching_rule(path)?.is_some_and(IgnoreRule::exclude))
    }

    /// The rule deciding the fate of `path`, if any
    ///
    /// Scoped rules win over absolute ones. They are consulted from the directory of
    /// `path` upward; the first directory whose rules match anything decides. Within a
    /// rule set, the last matching rule wins.
    pub fn matching_rule(&self, path: &str) -> anyhow::Result<Option<&IgnoreRule>> {
        if path.starts_with('/') || std::path::Path::new(path).is_absolute() {
            return Err(StoreError::invalid_input(format!(
                "ignore checks need a path relative to the repository root, got {path}"
            )));
        }

        let path = path.strip_prefix("./").unwrap_or(path);
        let mut directory = parent_of(path.trim_end_matches('/'));

        loop {
            if let Some(rules) = self.scoped.get(directory) {
                let relative = match directory {
                    "" => path,
                    directory => path
                        .strip_prefix(directory)
                        .and_then(|rest| rest.strip_prefix('/'))
                        .unwrap_or(path),
                };

                if let Some(rule) = last_match(rules, relative) {
                    return Ok(Some(rule));
                }
            }

            if directory.is_empty() {
                break;
            }
            directory = parent_of(directory);
        }

        Ok(last_match(&self.absolute, path))
    }
}

fn last_match<'r>(rules: &'r [IgnoreRule], path: &str) -> Option<&'r IgnoreRule> {
    rules.iter().rev().find(|rule| rule.matches(path))
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}
