mod authenticate;
mod authorize;
mod role;
mod status;
mod user;

use padlock_framework::{extract::Extension, get, put, Router, SyncService};
use padlock_types::{request::Request, response::Response};

use crate::context::{AdminContext, AuthenticateContext, AuthorizeContext, StoreHandle};

use self::{
    authenticate::handle_authenticate,
    authorize::handle_allow,
    role::{handle_get_role, handle_list_roles},
    status::{handle_alive, handle_ready},
    user::{
        handle_create_user, handle_delete_user, handle_get_user, handle_list_users,
        handle_set_user_roles, handle_update_user,
    },
};

pub fn new_user_management_service(
    prefix: &str,
    ctx: AdminContext,
    store: StoreHandle,
) -> SyncService<Request, Response> {
    Router::new()
        .route(format!("{prefix}/role"), get(handle_list_roles))
        .route(format!("{prefix}/role/:name"), get(handle_get_role))
        .route(
            format!("{prefix}/user"),
            get(handle_list_users).post(handle_create_user),
        )
        .route(
            format!("{prefix}/user/:id"),
            get(handle_get_user)
                .put(handle_update_user)
                .delete(handle_delete_user),
        )
        .route(format!("{prefix}/user/:id/roles"), put(handle_set_user_roles))
        .route(format!("{prefix}/alive"), get(handle_alive))
        .route(format!("{prefix}/ready"), get(handle_ready))
        .layer(Extension(ctx))
        .layer(Extension(store))
        .build()
        .into_service()
}

pub fn new_authorize_service(
    prefix: &str,
    ctx: AuthorizeContext,
    store: StoreHandle,
) -> SyncService<Request, Response> {
    Router::new()
        .route(format!("{prefix}/allow"), get(handle_allow))
        .route(format!("{prefix}/alive"), get(handle_alive))
        .route(format!("{prefix}/ready"), get(handle_ready))
        .layer(Extension(ctx))
        .layer(Extension(store))
        .build()
        .into_service()
}

pub fn new_authenticate_service(
    prefix: &str,
    ctx: AuthenticateContext,
    store: StoreHandle,
) -> SyncService<Request, Response> {
    Router::new()
        .route(format!("{prefix}/authenticate"), get(handle_authenticate))
        .route(format!("{prefix}/alive"), get(handle_alive))
        .route(format!("{prefix}/ready"), get(handle_ready))
        .layer(Extension(ctx))
        .layer(Extension(store))
        .build()
        .into_service()
}
