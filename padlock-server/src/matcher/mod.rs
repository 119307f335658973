mod group;
mod host;
mod normalize;
mod path;

use std::collections::BTreeSet;

pub use group::GroupMatcher;
pub use host::HostMatcher;
pub use normalize::normalize_path;
pub use path::PathMatcher;

/// Outcome of a rule-tree lookup. A matched surface with an empty permission
/// set is not the same as an unmatched surface: the former means the API is
/// known but nobody is allowed, the latter means policy does not know the
/// API at all. Both deny, but logs must tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Match(BTreeSet<String>),
    NoMatch,
}

impl MatchOutcome {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match(_))
    }
}
