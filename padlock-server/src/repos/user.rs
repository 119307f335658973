use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use padlock_types::user::{UserConfig, UserDetails};
use sqlx::SqlitePool;

use crate::error::Error;

/// The persistent user store: user rows, the role-name table, and the
/// user-role association table. Multi-step operations run inside one
/// transaction.
#[derive(Clone)]
pub struct UserRepo {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: String,
    username: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_details(self, roles: BTreeSet<String>) -> UserDetails {
        UserDetails {
            config: UserConfig {
                user_id: self.user_id,
                username: self.username,
                email: self.email,
                first_name: self.first_name,
                last_name: self.last_name,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
            roles,
        }
    }
}

impl UserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the user row and bind the given roles atomically.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        config: &UserConfig,
        roles: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (user_id, username, email, first_name, last_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&config.user_id)
        .bind(&config.username)
        .bind(&config.email)
        .bind(&config.first_name)
        .bind(&config.last_name)
        .bind(now)
        .bind(now)
        .execute(&mut tx)
        .await?;

        for role in roles {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_name)
                VALUES (?, ?)",
            )
            .bind(&config.user_id)
            .bind(role)
            .execute(&mut tx)
            .await?;
        }

        tx.commit().await.map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user_id: &str) -> Result<Option<UserDetails>, Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, username, email, first_name, last_name, created_at, updated_at
            FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let roles: Vec<(String,)> =
            sqlx::query_as("SELECT role_name FROM user_roles WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(
            row.into_details(roles.into_iter().map(|(role,)| role).collect()),
        ))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserDetails>, Error> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT user_id, username, email, first_name, last_name, created_at, updated_at
            FROM users ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let bindings: Vec<(String, String)> =
            sqlx::query_as("SELECT user_id, role_name FROM user_roles")
                .fetch_all(&self.pool)
                .await?;
        let mut bindings_by_user: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (user_id, role) in bindings {
            bindings_by_user.entry(user_id).or_default().insert(role);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let roles = bindings_by_user.remove(&row.user_id).unwrap_or_default();
                row.into_details(roles)
            })
            .collect())
    }

    /// Update the optional identity fields of a user. Returns `false` when
    /// the user does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, config: &UserConfig, now: DateTime<Utc>) -> Result<bool, Error> {
        sqlx::query(
            "UPDATE users SET username = ?, email = ?, first_name = ?, last_name = ?, updated_at = ?
            WHERE user_id = ?",
        )
        .bind(&config.username)
        .bind(&config.email)
        .bind(&config.first_name)
        .bind(&config.last_name)
        .bind(now)
        .bind(&config.user_id)
        .execute(&self.pool)
        .await
        .map(|res| res.rows_affected() == 1)
        .map_err(Into::into)
    }

    /// Remove the user. Role bindings are cleared first, inside the same
    /// transaction. Returns `false` when the user does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: &str) -> Result<bool, Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut tx)
            .await?
            .rows_affected()
            == 1;

        tx.commit().await?;
        Ok(deleted)
    }

    /// Replace the role bindings of a user. Returns `false` when the user
    /// does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn set_roles(&self, user_id: &str, roles: &BTreeSet<String>) -> Result<bool, Error> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut tx)
            .await?;
        for role in roles {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_name)
                VALUES (?, ?)",
            )
            .bind(user_id)
            .bind(role)
            .execute(&mut tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Bind additional roles to a user. Already-bound roles are left alone.
    #[tracing::instrument(skip(self))]
    pub async fn add_roles(&self, user_id: &str, roles: &BTreeSet<String>) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        for role in roles {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_name)
                VALUES (?, ?)
                ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(role)
            .execute(&mut tx)
            .await?;
        }

        tx.commit().await.map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_roles(&self, user_id: &str, roles: &BTreeSet<String>) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        for role in roles {
            sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_name = ?")
                .bind(user_id)
                .bind(role)
                .execute(&mut tx)
                .await?;
        }

        tx.commit().await.map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn users_of_role(&self, role: &str) -> Result<Vec<String>, Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT user_id FROM user_roles WHERE role_name = ? ORDER BY user_id")
                .bind(role)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn role_names(&self) -> Result<BTreeSet<String>, Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM roles")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Bring the persisted role-name set in line with configuration: roles
    /// that are no longer configured are removed (their user bindings
    /// cleared first), newly configured roles are inserted. One transaction.
    #[tracing::instrument(skip(self, configured))]
    pub async fn reconcile_role_names(&self, configured: &BTreeSet<String>) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM roles")
            .fetch_all(&mut tx)
            .await?;
        let current: BTreeSet<String> = rows.into_iter().map(|(name,)| name).collect();

        for removed in current.difference(configured) {
            sqlx::query("DELETE FROM user_roles WHERE role_name = ?")
                .bind(removed)
                .execute(&mut tx)
                .await?;
            sqlx::query("DELETE FROM roles WHERE name = ?")
                .bind(removed)
                .execute(&mut tx)
                .await?;
        }

        for added in configured.difference(&current) {
            sqlx::query("INSERT INTO roles (name) VALUES (?)")
                .bind(added)
                .execute(&mut tx)
                .await?;
        }

        tx.commit().await.map_err(Into::into)
    }
}
