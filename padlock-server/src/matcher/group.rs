use std::collections::HashMap;

use padlock_types::request::Method;
use padlock_types::rule::{AuthorizationRules, WILDCARD};

use crate::error::Error;

use super::{HostMatcher, MatchOutcome};

/// The compiled rule tree: host -> [`HostMatcher`], with a `*` fallback
/// entry. Built once at startup, immutable afterwards.
#[derive(Debug, Clone)]
pub struct GroupMatcher {
    hosts: HashMap<String, HostMatcher>,
}

impl GroupMatcher {
    /// Compile the configured rule tree.
    ///
    /// # Errors
    ///
    /// Returns an error when any host rule fails to compile.
    pub fn new(rules: &AuthorizationRules) -> Result<Self, Error> {
        let hosts = rules
            .hosts
            .iter()
            .map(|rule| HostMatcher::new(rule).map(|matcher| (rule.host.clone(), matcher)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self { hosts })
    }

    /// The `*` host is consulted iff no literal entry exists for the
    /// request host.
    #[must_use]
    pub fn matches(&self, host: &str, path: &str, method: Method) -> MatchOutcome {
        if let Some(host_matcher) = self.hosts.get(host) {
            return host_matcher.matches(path, method);
        }
        if let Some(host_matcher) = self.hosts.get(WILDCARD) {
            return host_matcher.matches(path, method);
        }
        MatchOutcome::NoMatch
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use padlock_types::rule::{HostRule, PathRule};

    use super::*;

    fn host_rule(host: &str, pattern: &str, method: &str, perms: &[&str]) -> HostRule {
        HostRule {
            host: host.into(),
            paths: vec![PathRule {
                path_pattern: pattern.into(),
                permissions_for_method: [(
                    method.to_string(),
                    perms.iter().map(ToString::to_string).collect(),
                )]
                .into_iter()
                .collect(),
            }],
        }
    }

    fn permissions(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn literal_host_wins_over_wildcard() {
        let matcher = GroupMatcher::new(&AuthorizationRules {
            hosts: vec![
                host_rule("api.test", "^/items$", "GET", &["read"]),
                host_rule(WILDCARD, "^/.*$", "*", &["catch-all"]),
            ],
        })
        .unwrap();

        assert_eq!(
            matcher.matches("api.test", "/items", Method::Get),
            MatchOutcome::Match(permissions(&["read"]))
        );
        // Unknown host falls back to the wildcard entry.
        assert_eq!(
            matcher.matches("other.test", "/any", Method::Post),
            MatchOutcome::Match(permissions(&["catch-all"]))
        );
    }

    #[test]
    fn literal_host_miss_does_not_fall_back() {
        let matcher = GroupMatcher::new(&AuthorizationRules {
            hosts: vec![
                host_rule("api.test", "^/items$", "GET", &["read"]),
                host_rule(WILDCARD, "^/.*$", "*", &["catch-all"]),
            ],
        })
        .unwrap();

        // The literal entry exists, so its NoMatch is final.
        assert_eq!(
            matcher.matches("api.test", "/other", Method::Get),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn no_wildcard_no_match() {
        let matcher = GroupMatcher::new(&AuthorizationRules {
            hosts: vec![host_rule("api.test", "^/items$", "GET", &["read"])],
        })
        .unwrap();

        assert_eq!(
            matcher.matches("other.test", "/items", Method::Get),
            MatchOutcome::NoMatch
        );
    }
}
