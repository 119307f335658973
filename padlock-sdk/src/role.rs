use std::sync::Arc;

pub use padlock_types::methods::role::{GetRoleResponse, ListRolesResponse};
pub use padlock_types::role::Role;

use crate::base::BaseClient;

pub struct Client {
    client: Arc<BaseClient>,
}

impl Client {
    pub(crate) fn new(client: Arc<BaseClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<ListRolesResponse, String> {
        self.client.get("/role".into()).await
    }

    pub async fn get(&self, name: &str) -> Result<GetRoleResponse, String> {
        self.client.get(format!("/role/{name}")).await
    }
}
