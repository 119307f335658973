use std::sync::Arc;

use crate::base::{BaseClient, SideCall};

/// Client for the authentication side-call surface.
pub struct Client {
    client: Arc<BaseClient>,
}

impl Client {
    pub fn new(api_url: impl ToString) -> Self {
        Self {
            client: Arc::new(BaseClient::new(api_url)),
        }
    }

    /// Issue `GET /authenticate` with a bearer token. Identity values come
    /// back in the response headers of the [`SideCall`].
    pub async fn authenticate(&self, token: &str) -> Result<SideCall, String> {
        self.client
            .side_call(
                "/authenticate".into(),
                &[("Authorization".to_string(), format!("Bearer {token}"))],
            )
            .await
    }

    pub async fn alive(&self) -> Result<u16, String> {
        self.client
            .side_call("/alive".into(), &[])
            .await
            .map(|call| call.status)
    }

    pub async fn ready(&self) -> Result<u16, String> {
        self.client
            .side_call("/ready".into(), &[])
            .await
            .map(|call| call.status)
    }
}
