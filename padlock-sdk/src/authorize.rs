use std::sync::Arc;

use crate::base::{BaseClient, SideCall};

/// Client for the authorization side-call surface.
pub struct Client {
    client: Arc<BaseClient>,
}

impl Client {
    pub fn new(api_url: impl ToString) -> Self {
        Self {
            client: Arc::new(BaseClient::new(api_url)),
        }
    }

    /// Issue `GET /allow` with the given forwarded headers.
    pub async fn allow(&self, headers: &[(String, String)]) -> Result<SideCall, String> {
        self.client.side_call("/allow".into(), headers).await
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
