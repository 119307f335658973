use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::user::{UserConfig, UserDetails, UserWithPermissions};

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateUserParams {
    pub user: UserConfig,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateUserResponse {
    pub user: UserDetails,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GetUserResponse {
    pub user: UserWithPermissions,
}

/// Query parameters of the user listing.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ListUsersQuery {
    /// Restrict the listing to users bound to this role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserDetails>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateUserParams {
    pub user: UserConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateUserResponse {
    pub user: UserDetails,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DeleteUserResponse {
    #[serde(rename = "userID")]
    pub user_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SetUserRolesParams {
    pub roles: BTreeSet<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SetUserRolesResponse {
    pub user: UserDetails,
}
