use padlock_framework::extract::Extension;
use padlock_types::{error::ApiError, response::Response};

use crate::{context::StoreHandle, error::Error};

pub async fn handle_alive() -> Result<Response, ApiError> {
    Ok(Response::ok())
}

pub async fn handle_ready(Extension(store): Extension<StoreHandle>) -> Result<Response, Error> {
    store.repos.ping().await?;
    Ok(Response::ok())
}
