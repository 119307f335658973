use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use padlock_types::request::Method;
use padlock_types::rule::{PathRule, WILDCARD};

use crate::checker::RegexChecker;
use crate::error::{Error, ErrorType};

use super::MatchOutcome;

/// Permissions for one path pattern, selected by method with `*` fallback.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: RegexChecker,
    methods: HashMap<Method, BTreeSet<String>>,
    fallback: Option<BTreeSet<String>>,
}

impl PathMatcher {
    /// Compile one configured path rule.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` when the pattern does not compile or a method
    /// key is neither a permitted HTTP verb nor `*`.
    pub fn new(rule: &PathRule) -> Result<Self, Error> {
        let pattern = RegexChecker::new(&rule.path_pattern)?;

        let mut methods = HashMap::new();
        let mut fallback = None;
        for (method, permissions) in &rule.permissions_for_method {
            let permissions: BTreeSet<String> = permissions.iter().cloned().collect();
            if method == WILDCARD {
                fallback = Some(permissions);
            } else {
                let method = Method::from_str(method).map_err(|_| {
                    Error::from(ErrorType::MalformedInput(format!(
                        "`{method}` is not a valid method key for pattern `{}`",
                        rule.path_pattern
                    )))
                })?;
                methods.insert(method, permissions);
            }
        }

        Ok(Self {
            pattern,
            methods,
            fallback,
        })
    }

    /// Length of the pattern string; the host matcher orders by it.
    #[must_use]
    pub fn pattern_len(&self) -> usize {
        self.pattern.pattern().len()
    }

    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }

    /// The wildcard entry is consulted iff no literal method key exists.
    #[must_use]
    pub fn matches(&self, path: &str, method: Method) -> MatchOutcome {
        if !self.pattern.matches(path) {
            return MatchOutcome::NoMatch;
        }
        if let Some(permissions) = self.methods.get(&method) {
            return MatchOutcome::Match(permissions.clone());
        }
        if let Some(permissions) = self.fallback.as_ref() {
            return MatchOutcome::Match(permissions.clone());
        }
        MatchOutcome::NoMatch
    }
}
