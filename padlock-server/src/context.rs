use std::sync::Arc;

use crate::{
    checker::Validators,
    config::{RequestParamHeaders, TargetClaims},
    introspect::Introspector,
    matcher::GroupMatcher,
    oidc::OidcClient,
    registry::RoleRegistry,
    repos::Repos,
    users::UserManager,
};

/// State handed to the user-management handlers.
#[derive(Clone)]
pub struct AdminContext {
    pub users: UserManager,
    pub registry: Arc<RoleRegistry>,
    pub validators: Arc<Validators>,
}

/// State handed to the authorization handlers.
#[derive(Clone)]
pub struct AuthorizeContext {
    pub matcher: Arc<GroupMatcher>,
    pub users: UserManager,
    pub headers: Arc<RequestParamHeaders>,
    pub validators: Arc<Validators>,
    pub auto_add: bool,
}

/// State handed to the authentication handlers.
#[derive(Clone)]
pub struct AuthenticateContext {
    pub oidc: Arc<OidcClient>,
    /// Present iff introspection is enabled.
    pub introspector: Option<Introspector>,
    pub claims: Arc<TargetClaims>,
    pub headers: Arc<RequestParamHeaders>,
}

/// Allows the readiness handler to ping the store regardless of which
/// subsystem router it is mounted in.
#[derive(Clone)]
pub struct StoreHandle {
    pub repos: Repos,
}
