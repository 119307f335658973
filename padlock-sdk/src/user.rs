use std::sync::Arc;

pub use padlock_types::methods::user::{
    CreateUserParams, CreateUserResponse, DeleteUserResponse, GetUserResponse, ListUsersQuery,
    ListUsersResponse, SetUserRolesParams, SetUserRolesResponse, UpdateUserParams,
    UpdateUserResponse,
};
pub use padlock_types::user::UserConfig;

use crate::base::BaseClient;

pub struct Client {
    client: Arc<BaseClient>,
}

impl Client {
    pub(crate) fn new(client: Arc<BaseClient>) -> Self {
        Self { client }
    }

    pub async fn create(&self, params: &CreateUserParams) -> Result<CreateUserResponse, String> {
        self.client.post("/user".into(), params).await
    }

    pub async fn list(&self) -> Result<ListUsersResponse, String> {
        self.client.get("/user".into()).await
    }

    /// List only the users bound to the given role.
    pub async fn list_by_role(&self, role: &str) -> Result<ListUsersResponse, String> {
        self.client.get(format!("/user?role={role}")).await
    }

    pub async fn get(&self, user_id: &str) -> Result<GetUserResponse, String> {
        self.client.get(format!("/user/{user_id}")).await
    }

    pub async fn update(
        &self,
        user_id: &str,
        params: &UpdateUserParams,
    ) -> Result<UpdateUserResponse, String> {
        self.client.put(format!("/user/{user_id}"), params).await
    }

    pub async fn delete(&self, user_id: &str) -> Result<DeleteUserResponse, String> {
        self.client.delete(format!("/user/{user_id}")).await
    }

    pub async fn set_roles(
        &self,
        user_id: &str,
        params: &SetUserRolesParams,
    ) -> Result<SetUserRolesResponse, String> {
        self.client
            .put(format!("/user/{user_id}/roles"), params)
            .await
    }
}
