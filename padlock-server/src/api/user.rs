use padlock_framework::extract::{Extension, Json, Path, Query};
use padlock_types::{
    methods::user::{
        CreateUserParams, CreateUserResponse, DeleteUserResponse, GetUserResponse,
        ListUsersQuery, ListUsersResponse, SetUserRolesParams, SetUserRolesResponse,
        UpdateUserParams, UpdateUserResponse,
    },
    response::Response,
    user::UserConfig,
};

use crate::{
    checker::Validators,
    context::AdminContext,
    error::{Error, ErrorType},
};

fn check_user_config(validators: &Validators, config: &UserConfig) -> Result<(), Error> {
    if !validators.user_id.matches(&config.user_id) {
        return Err(ErrorType::MalformedInput(format!(
            "`{}` is not a valid user id",
            config.user_id
        ))
        .into());
    }
    if let Some(username) = config.username.as_deref() {
        if !validators.username.matches(username) {
            return Err(
                ErrorType::MalformedInput(format!("`{username}` is not a valid username")).into(),
            );
        }
    }
    for name in [config.first_name.as_deref(), config.last_name.as_deref()]
        .into_iter()
        .flatten()
    {
        if !validators.personal_name.matches(name) {
            return Err(
                ErrorType::MalformedInput(format!("`{name}` is not a valid name")).into(),
            );
        }
    }
    Ok(())
}

pub async fn handle_create_user(
    Extension(ctx): Extension<AdminContext>,
    Json(body): Json<CreateUserParams>,
) -> Result<Response, Error> {
    check_user_config(&ctx.validators, &body.user)?;
    let user = ctx.users.define_user(&body.user, &body.roles).await?;
    Response::raw(CreateUserResponse { user }).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub async fn handle_list_users(
    Extension(ctx): Extension<AdminContext>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Response, Error> {
    let users = match query.role.as_deref() {
        Some(role) => {
            let mut users = Vec::new();
            for user_id in ctx.users.users_of_role(role).await? {
                if let Some(details) = ctx.users.get_user(&user_id).await? {
                    users.push(details);
                }
            }
            users
        }
        None => ctx.users.list_users().await?,
    };
    Response::raw(ListUsersResponse { users }).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub async fn handle_get_user(
    Extension(ctx): Extension<AdminContext>,
    Path(id): Path,
) -> Result<Response, Error> {
    let user = ctx
        .users
        .user_with_permissions(&id)
        .await?
        .ok_or_else(|| Error::from(ErrorType::NotFound(format!("User `{id}` not found"))))?;
    Response::raw(GetUserResponse { user }).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub async fn handle_update_user(
    Extension(ctx): Extension<AdminContext>,
    Path(id): Path,
    Json(body): Json<UpdateUserParams>,
) -> Result<Response, Error> {
    if body.user.user_id != id {
        return Err(ErrorType::MalformedInput(format!(
            "user id `{}` in the payload does not match `{id}`",
            body.user.user_id
        ))
        .into());
    }
    check_user_config(&ctx.validators, &body.user)?;

    let user = ctx.users.update_user(&body.user).await?;
    Response::raw(UpdateUserResponse { user }).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub async fn handle_delete_user(
    Extension(ctx): Extension<AdminContext>,
    Path(id): Path,
) -> Result<Response, Error> {
    ctx.users.delete_user(&id).await?;
    Response::raw(DeleteUserResponse { user_id: id })
        .map_err(|err| ErrorType::BadResponseData(err).into())
}

pub async fn handle_set_user_roles(
    Extension(ctx): Extension<AdminContext>,
    Path(id): Path,
    Json(body): Json<SetUserRolesParams>,
) -> Result<Response, Error> {
    let user = ctx.users.set_roles(&id, &body.roles).await?;
    Response::raw(SetUserRolesResponse { user })
        .map_err(|err| ErrorType::BadResponseData(err).into())
}
