use serde::{Deserialize, Serialize};

use crate::role::Role;

#[derive(Debug, Deserialize, Serialize)]
pub struct GetRoleResponse {
    pub role: Role,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ListRolesResponse {
    pub roles: Vec<Role>,
}
