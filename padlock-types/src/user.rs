use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied identity fields of a user. `user_id` is the unique,
/// immutable key; everything else is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserConfig {
    #[must_use]
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }
}

/// A user as stored, together with its currently bound role names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(flatten)]
    pub config: UserConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub roles: BTreeSet<String>,
}

impl UserDetails {
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }
}

/// [`UserDetails`] enriched with the effective permission set computed from
/// the role registry. Display form served by the admin API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserWithPermissions {
    #[serde(flatten)]
    pub details: UserDetails,
    pub associated_permission: BTreeSet<String>,
}
