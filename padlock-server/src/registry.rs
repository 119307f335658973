use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{error::Error, repos::user::UserRepo};

/// In-memory projection of role -> permission set. Reconciled against the
/// store on startup; readers take an immutable snapshot so a reconcile in
/// flight is never observed half-swapped.
pub struct RoleRegistry {
    roles: RwLock<Arc<HashMap<String, BTreeSet<String>>>>,
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Align the store's role-name set with configuration, then publish the
    /// configured map. The in-memory swap only happens once the store
    /// transaction has committed.
    #[tracing::instrument(skip_all, fields(roles = configured.len()))]
    pub async fn reconcile(
        &self,
        repo: &UserRepo,
        configured: &HashMap<String, BTreeSet<String>>,
    ) -> Result<(), Error> {
        let names: BTreeSet<String> = configured.keys().cloned().collect();
        repo.reconcile_role_names(&names).await?;

        let snapshot = Arc::new(configured.clone());
        *self.roles.write() = snapshot;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, role: &str) -> Option<BTreeSet<String>> {
        self.snapshot().get(role).cloned()
    }

    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        self.snapshot().contains_key(role)
    }

    /// Point-in-time view of the whole registry.
    #[must_use]
    pub fn snapshot(&self) -> Arc<HashMap<String, BTreeSet<String>>> {
        Arc::clone(&self.roles.read())
    }

    /// Union of the permission sets of the given roles. Unknown roles
    /// contribute nothing.
    #[must_use]
    pub fn permissions_of(&self, roles: &BTreeSet<String>) -> BTreeSet<String> {
        let snapshot = self.snapshot();
        roles
            .iter()
            .filter_map(|role| snapshot.get(role))
            .flatten()
            .cloned()
            .collect()
    }
}
