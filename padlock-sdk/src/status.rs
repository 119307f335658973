use std::sync::Arc;

use crate::base::BaseClient;

pub struct Client {
    client: Arc<BaseClient>,
}

impl Client {
    pub(crate) fn new(client: Arc<BaseClient>) -> Self {
        Self { client }
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
