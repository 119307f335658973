use padlock_framework::extract::{Extension, Path};
use padlock_types::{
    methods::role::{GetRoleResponse, ListRolesResponse},
    response::Response,
    role::Role,
};

use crate::{
    context::AdminContext,
    error::{Error, ErrorType},
};

pub async fn handle_list_roles(
    Extension(ctx): Extension<AdminContext>,
) -> Result<Response, Error> {
    let snapshot = ctx.registry.snapshot();
    let mut roles: Vec<Role> = snapshot
        .iter()
        .map(|(name, permissions)| Role::new(name.clone(), permissions.clone()))
        .collect();
    roles.sort_by(|a, b| a.name.cmp(&b.name));

    Response::raw(ListRolesResponse { roles }).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub async fn handle_get_role(
    Extension(ctx): Extension<AdminContext>,
    Path(name): Path,
) -> Result<Response, Error> {
    let permissions = ctx
        .registry
        .get(&name)
        .ok_or_else(|| Error::from(ErrorType::NotFound(format!("Role `{name}` not found"))))?;
    let resp = GetRoleResponse {
        role: Role::new(name, permissions),
    };
    Response::raw(resp).map_err(|err| ErrorType::BadResponseData(err).into())
}
