use padlock_types::request::Method;
use padlock_types::rule::HostRule;

use crate::error::Error;

use super::{MatchOutcome, PathMatcher};

/// All path rules of one host, ordered by pattern string length descending
/// so the longest (most specific) pattern is tried first.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    name: String,
    paths: Vec<PathMatcher>,
}

impl HostMatcher {
    /// Compile one configured host rule.
    ///
    /// # Errors
    ///
    /// Returns an error when any of the host's path rules fails to compile.
    pub fn new(rule: &HostRule) -> Result<Self, Error> {
        let mut paths = rule
            .paths
            .iter()
            .map(PathMatcher::new)
            .collect::<Result<Vec<_>, _>>()?;
        paths.sort_by(|a, b| b.pattern_len().cmp(&a.pattern_len()));

        Ok(Self {
            name: rule.host.clone(),
            paths,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First non-`NoMatch` wins; a pattern whose regex matches but carries no
    /// entry for the method falls through to shorter patterns.
    #[must_use]
    pub fn matches(&self, path: &str, method: Method) -> MatchOutcome {
        for path_matcher in &self.paths {
            if !path_matcher.matches_path(path) {
                continue;
            }
            let outcome = path_matcher.matches(path, method);
            if outcome.is_match() {
                return outcome;
            }
        }
        MatchOutcome::NoMatch
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use padlock_types::rule::PathRule;

    use super::*;

    fn path_rule(pattern: &str, methods: &[(&str, &[&str])]) -> PathRule {
        PathRule {
            path_pattern: pattern.into(),
            permissions_for_method: methods
                .iter()
                .map(|(method, permissions)| {
                    (
                        (*method).to_string(),
                        permissions.iter().map(ToString::to_string).collect(),
                    )
                })
                .collect(),
        }
    }

    fn permissions(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn longest_pattern_wins() {
        let matcher = HostMatcher::new(&HostRule {
            host: "api.test".into(),
            paths: vec![
                path_rule("^/items/.*$", &[("GET", &["read"])]),
                path_rule("^/items/[a-z]+/extra$", &[("GET", &["extra"])]),
            ],
        })
        .unwrap();

        // Both patterns match; the longer pattern string takes precedence.
        assert_eq!(
            matcher.matches("/items/widgets/extra", Method::Get),
            MatchOutcome::Match(permissions(&["extra"]))
        );
        assert_eq!(
            matcher.matches("/items/widgets", Method::Get),
            MatchOutcome::Match(permissions(&["read"]))
        );
    }

    #[test]
    fn method_miss_falls_through_to_shorter_pattern() {
        let matcher = HostMatcher::new(&HostRule {
            host: "api.test".into(),
            paths: vec![
                path_rule("^/items/.*$", &[("*", &["any"])]),
                path_rule("^/items/[a-z]+/extra$", &[("GET", &["extra"])]),
            ],
        })
        .unwrap();

        assert_eq!(
            matcher.matches("/items/widgets/extra", Method::Post),
            MatchOutcome::Match(permissions(&["any"]))
        );
    }

    #[test]
    fn no_pattern_matches() {
        let matcher = HostMatcher::new(&HostRule {
            host: "api.test".into(),
            paths: vec![path_rule("^/items$", &[("GET", &["read"])])],
        })
        .unwrap();

        assert_eq!(
            matcher.matches("/other", Method::Get),
            MatchOutcome::NoMatch
        );
    }
}
