use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
enum Matcher {
    Glob(Pattern),
    Literal(String),
}

impl Matcher {
    fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Glob(pattern) => pattern.matches_with(candidate, MATCH_OPTIONS),
            Matcher::Literal(literal) => literal == candidate,
        }
    }
}

/// One line of an ignore file
///
/// `exclude` is false for negated (`!`) rules, which re-include what an earlier
/// rule excluded.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: String,
    exclude: bool,
    /// Trailing `/`: the rule only matches directories
    directory_only: bool,
    /// Leading or inner `/`: the rule matches from its base directory only
    anchored: bool,
    matcher: Matcher,
}

impl IgnoreRule {
    /// Parse one ignore-file line; blank lines and `#` comments yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();

        let (pattern, exclude) = match line.chars().next()? {
            '#' => return None,
            '!' => (&line[1..], false),
            '\\' => (&line[1..], true),
            _ => (line, true),
        };

        Some(Self::compile(pattern, exclude))
    }

    pub fn parse_lines(contents: &str) -> Vec<Self> {
        contents.lines().filter_map(Self::parse).collect()
    }

    fn compile(pattern: &str, exclude: bool) -> Self {
        let directory_only = pattern.len() > 1 && pattern.ends_with('/');
        let body = pattern.trim_end_matches('/');
        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');

        let matcher = Pattern::new(body)
            .or_else(|_| Pattern::new(&Pattern::escape(body)))
            .map(Matcher::Glob)
            .unwrap_or_else(|_| Matcher::Literal(body.to_string()));

        IgnoreRule {
            pattern: pattern.to_string(),
            exclude,
            directory_only,
            anchored,
            matcher,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn exclude(&self) -> bool {
        self.exclude
    }

    /// Whether the rule matches `path`, given relative to the rule's base directory
    ///
    /// A rule that matches a directory also matches everything below it. A trailing
    /// `/` on `path` marks it as a directory.
    pub fn matches(&self, path: &str) -> bool {
        let is_dir = path.ends_with('/');
        let path = path.trim_end_matches('/');

        let ancestors = path
            .match_indices('/')
            .map(|(at, _)| (&path[..at], true));

        ancestors
            .chain(std::iter::once((path, is_dir)))
            .any(|(candidate, candidate_is_dir)| self.matches_one(candidate, candidate_is_dir))
    }

    fn matches_one(&self, candidate: &str, is_dir: bool) -> bool {
        if self.directory_only && !is_dir {
            return false;
        }

        if self.anchored {
            self.matcher.matches(candidate)
        } else {
            let basename = candidate.rsplit('/').next().unwrap_or(candidate);
            self.matcher.matches(basename)
        }
    }
}

impl PartialEq for IgnoreRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.exclude == other.exclude
    }
}

impl Eq for IgnoreRule {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("*.log", "*.log", true)]
    #[case("!keep.log", "keep.log", false)]
    #[case("\\!important", "!important", true)]
    #[case("\\#hash", "#hash", true)]
    #[case("  build/  ", "build/", true)]
    fn lines_parse_into_rules(#[case] line: &str, #[case] pattern: &str, #[case] exclude: bool) {
        let rule = IgnoreRule::parse(line).unwrap();

        assert_eq!(rule.pattern(), pattern);
        assert_eq!(rule.exclude(), exclude);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let rules = IgnoreRule::parse_lines("# comment\r\n\r\n*.o\r\n   \n!main.o\n");

        assert_eq!(
            rules.iter().map(IgnoreRule::pattern).collect::<Vec<_>>(),
            vec!["*.o", "main.o"]
        );
    }

    #[rstest]
    #[case("*.log", "a.log", true)]
    #[case("*.log", "deep/nested/a.log", true)]
    #[case("*.log", "a.log.txt", false)]
    #[case("target", "target/debug/app", true)]
    #[case("target/", "target", false)]
    #[case("target/", "target/", true)]
    #[case("target/", "crate/target/out.o", true)]
    #[case("/root.txt", "root.txt", true)]
    #[case("/root.txt", "sub/root.txt", false)]
    #[case("doc/*.md", "doc/a.md", true)]
    #[case("doc/*.md", "doc/sub/a.md", false)]
    #[case("doc/**/*.md", "doc/sub/a.md", true)]
    #[case("[ab].txt", "b.txt", true)]
    #[case("[unclosed", "[unclosed", true)]
    fn rules_follow_gitignore_matching(
        #[case] pattern: &str,
        #[case] path: &str,
        #[case] expected: bool,
    ) {
        let rule = IgnoreRule::parse(pattern).unwrap();

        assert_eq!(rule.matches(path), expected);
    }
}
