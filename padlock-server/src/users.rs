use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use padlock_types::user::{UserConfig, UserDetails, UserWithPermissions};

use crate::{
    error::{Error, ErrorType},
    registry::RoleRegistry,
    repos::user::UserRepo,
};

/// Facade over the role registry and the user store. Enforces role existence
/// on every write and answers permission queries.
#[derive(Clone)]
pub struct UserManager {
    repo: UserRepo,
    registry: Arc<RoleRegistry>,
}

impl UserManager {
    pub fn new(repo: UserRepo, registry: Arc<RoleRegistry>) -> Self {
        Self { repo, registry }
    }

    fn check_roles_exist(&self, roles: &BTreeSet<String>) -> Result<(), Error> {
        for role in roles {
            if !self.registry.contains(role) {
                return Err(ErrorType::UnknownRole { role: role.clone() }.into());
            }
        }
        Ok(())
    }

    /// Create a user and bind the given roles. Every role must be known to
    /// the registry.
    #[tracing::instrument(skip(self))]
    pub async fn define_user(
        &self,
        config: &UserConfig,
        roles: &BTreeSet<String>,
    ) -> Result<UserDetails, Error> {
        self.check_roles_exist(roles)?;
        self.repo.create(config, roles, Utc::now()).await?;
        self.require_user(&config.user_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserDetails>, Error> {
        self.repo.get(user_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserDetails>, Error> {
        self.repo.list().await
    }

    /// Update the identity fields of an existing user.
    #[tracing::instrument(skip(self))]
    pub async fn update_user(&self, config: &UserConfig) -> Result<UserDetails, Error> {
        if !self.repo.update(config, Utc::now()).await? {
            return Err(not_found(&config.user_id));
        }
        self.require_user(&config.user_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> Result<(), Error> {
        if !self.repo.delete(user_id).await? {
            return Err(not_found(user_id));
        }
        Ok(())
    }

    /// Replace a user's role bindings. Every role must be known to the
    /// registry.
    #[tracing::instrument(skip(self))]
    pub async fn set_roles(
        &self,
        user_id: &str,
        roles: &BTreeSet<String>,
    ) -> Result<UserDetails, Error> {
        self.check_roles_exist(roles)?;
        if !self.repo.set_roles(user_id, roles).await? {
            return Err(not_found(user_id));
        }
        self.require_user(user_id).await
    }

    /// Bind additional roles. Every role must be known to the registry.
    #[tracing::instrument(skip(self))]
    pub async fn add_roles(
        &self,
        user_id: &str,
        roles: &BTreeSet<String>,
    ) -> Result<UserDetails, Error> {
        self.check_roles_exist(roles)?;
        self.repo.add_roles(user_id, roles).await?;
        self.require_user(user_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_roles(
        &self,
        user_id: &str,
        roles: &BTreeSet<String>,
    ) -> Result<UserDetails, Error> {
        self.repo.remove_roles(user_id, roles).await?;
        self.require_user(user_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn users_of_role(&self, role: &str) -> Result<Vec<String>, Error> {
        self.repo.users_of_role(role).await
    }

    /// Whether the user's effective permissions intersect the allowed set.
    ///
    /// # Errors
    ///
    /// `UnknownUser` when no row exists for the id.
    #[tracing::instrument(skip(self, allowed))]
    pub async fn has_any_permission(
        &self,
        user_id: &str,
        allowed: &BTreeSet<String>,
    ) -> Result<bool, Error> {
        let user = self.repo.get(user_id).await?.ok_or_else(|| {
            Error::from(ErrorType::UnknownUser {
                user_id: user_id.to_string(),
            })
        })?;

        let effective = self.registry.permissions_of(&user.roles);
        Ok(effective.intersection(allowed).next().is_some())
    }

    /// The user together with its computed effective permission set, for
    /// display.
    #[tracing::instrument(skip(self))]
    pub async fn user_with_permissions(
        &self,
        user_id: &str,
    ) -> Result<Option<UserWithPermissions>, Error> {
        let Some(details) = self.repo.get(user_id).await? else {
            return Ok(None);
        };
        let associated_permission = self.registry.permissions_of(&details.roles);
        Ok(Some(UserWithPermissions {
            details,
            associated_permission,
        }))
    }

    async fn require_user(&self, user_id: &str) -> Result<UserDetails, Error> {
        self.repo
            .get(user_id)
            .await?
            .ok_or_else(|| not_found(user_id))
    }
}

fn not_found(user_id: &str) -> Error {
    ErrorType::NotFound(format!("User `{user_id}` not found")).into()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::repos::user::tests::pool;

    use super::*;

    async fn manager(roles: &[(&str, &[&str])]) -> UserManager {
        let repo = UserRepo::new(pool().await);
        let registry = Arc::new(RoleRegistry::new());
        let configured: HashMap<String, BTreeSet<String>> = roles
            .iter()
            .map(|(name, permissions)| {
                (
                    (*name).to_string(),
                    permissions.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();
        registry.reconcile(&repo, &configured).await.unwrap();
        UserManager::new(repo, registry)
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn define_user_rejects_unknown_role() {
        let manager = manager(&[("reader", &["read"])]).await;

        let err = manager
            .define_user(&UserConfig::new("u1".into()), &set(&["ghost"]))
            .await
            .unwrap_err();
        assert!(matches!(err.variant, ErrorType::UnknownRole { .. }));

        // Nothing was created
        assert!(manager.get_user("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn permission_intersection() {
        let manager = manager(&[("reader", &["read"]), ("writer", &["write"])]).await;

        manager
            .define_user(&UserConfig::new("u1".into()), &set(&["reader"]))
            .await
            .unwrap();

        assert!(manager
            .has_any_permission("u1", &set(&["read", "audit"]))
            .await
            .unwrap());
        assert!(!manager
            .has_any_permission("u1", &set(&["write"]))
            .await
            .unwrap());
        // A user with no permissions fails every check, including the empty
        // allowed set.
        assert!(!manager
            .has_any_permission("u1", &BTreeSet::new())
            .await
            .unwrap());

        let err = manager
            .has_any_permission("ghost", &set(&["read"]))
            .await
            .unwrap_err();
        assert!(matches!(err.variant, ErrorType::UnknownUser { .. }));
    }

    #[tokio::test]
    async fn user_with_permissions_unions_roles() {
        let manager = manager(&[("reader", &["read"]), ("writer", &["read", "write"])]).await;

        manager
            .define_user(
                &UserConfig::new("u1".into()),
                &set(&["reader", "writer"]),
            )
            .await
            .unwrap();

        let user = manager
            .user_with_permissions("u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.associated_permission, set(&["read", "write"]));

        assert!(manager
            .user_with_permissions("ghost")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn set_roles_requires_known_roles_and_user() {
        let manager = manager(&[("reader", &["read"])]).await;

        manager
            .define_user(&UserConfig::new("u1".into()), &BTreeSet::new())
            .await
            .unwrap();

        let err = manager
            .set_roles("u1", &set(&["ghost"]))
            .await
            .unwrap_err();
        assert!(matches!(err.variant, ErrorType::UnknownRole { .. }));

        let err = manager.set_roles("u2", &set(&["reader"])).await.unwrap_err();
        assert!(matches!(err.variant, ErrorType::NotFound(_)));

        let details = manager.set_roles("u1", &set(&["reader"])).await.unwrap();
        assert_eq!(details.roles, set(&["reader"]));
    }

    #[tokio::test]
    async fn incremental_role_binding() {
        let manager = manager(&[("reader", &["read"]), ("writer", &["write"])]).await;

        manager
            .define_user(&UserConfig::new("u1".into()), &set(&["reader"]))
            .await
            .unwrap();

        let err = manager.add_roles("u1", &set(&["ghost"])).await.unwrap_err();
        assert!(matches!(err.variant, ErrorType::UnknownRole { .. }));

        let details = manager.add_roles("u1", &set(&["writer"])).await.unwrap();
        assert_eq!(details.roles, set(&["reader", "writer"]));

        assert_eq!(manager.users_of_role("writer").await.unwrap(), vec!["u1"]);

        let details = manager
            .remove_roles("u1", &set(&["reader"]))
            .await
            .unwrap();
        assert_eq!(details.roles, set(&["writer"]));
        assert!(manager.users_of_role("reader").await.unwrap().is_empty());
    }
}
