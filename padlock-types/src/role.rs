use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A named bundle of permissions. Roles are defined entirely in
/// configuration; only the name is persisted so that user bindings can
/// reference it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub permissions: BTreeSet<String>,
}

impl Role {
    #[must_use]
    pub fn new(name: String, permissions: BTreeSet<String>) -> Self {
        Self { name, permissions }
    }
}
