use std::sync::Arc;

use base::BaseClient;

pub mod authenticate;
pub mod authorize;
pub(crate) mod base;
pub mod role;
pub mod status;
pub mod user;

pub use base::SideCall;

/// Client for the user-management (admin) surface of one padlock instance.
/// The side-call subsystems listen on their own ports; use
/// [`authorize::Client`] and [`authenticate::Client`] for those.
pub struct Client {
    pub user: crate::user::Client,
    pub role: crate::role::Client,
    pub status: crate::status::Client,
}

impl Client {
    pub fn new(api_url: impl ToString) -> Self {
        let base_client = Arc::new(BaseClient::new(api_url));

        let user = crate::user::Client::new(Arc::clone(&base_client));
        let role = crate::role::Client::new(Arc::clone(&base_client));
        let status = crate::status::Client::new(Arc::clone(&base_client));

        Self { user, role, status }
    }
}
