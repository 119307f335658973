use padlock_framework::extract::{Extension, Headers};
use padlock_types::response::Response;

use crate::{
    context::AuthenticateContext,
    error::{Error, ErrorType},
};

/// The authentication side-call: verify the bearer token and answer with the
/// caller's identity in the configured response headers.
pub async fn handle_authenticate(
    Extension(ctx): Extension<AuthenticateContext>,
    headers: Headers,
) -> Result<Response, Error> {
    let authorization = headers.get("authorization").ok_or_else(|| {
        Error::from(ErrorType::MalformedInput(
            "missing `Authorization` header".into(),
        ))
    })?;

    let mut parts = authorization.split_whitespace();
    let token = match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => token,
        _ => {
            return Err(ErrorType::MalformedInput(
                "`Authorization` header must be `Bearer <token>`".into(),
            )
            .into());
        }
    };

    let claims = ctx.oidc.parse_jwt(token)?;

    let jti = claims.required_string("jti")?;
    let user_id = claims.required_string(&ctx.claims.user_id)?;
    let username = match ctx.claims.username.as_deref() {
        Some(claim) => claims.optional_string(claim)?,
        None => None,
    };
    let first_name = match ctx.claims.first_name.as_deref() {
        Some(claim) => claims.optional_string(claim)?,
        None => None,
    };
    let last_name = match ctx.claims.last_name.as_deref() {
        Some(claim) => claims.optional_string(claim)?,
        None => None,
    };
    let email = match ctx.claims.email.as_deref() {
        Some(claim) => claims.optional_string(claim)?,
        None => None,
    };

    if let Some(introspector) = ctx.introspector.as_ref() {
        let expires_at = claims.expires_at()?;
        if !introspector.verify_token(token, expires_at).await? {
            return Err(ErrorType::AuthenticationFailed.into());
        }
    }

    tracing::debug!(jti, user_id, aud = ?claims.audiences(), "Authenticated caller");

    let mut response = Response::ok().header(ctx.headers.user_id.as_str(), user_id);
    if let Some(username) = username {
        response = response.header(ctx.headers.username.as_str(), username);
    }
    if let Some(first_name) = first_name {
        response = response.header(ctx.headers.first_name.as_str(), first_name);
    }
    if let Some(last_name) = last_name {
        response = response.header(ctx.headers.last_name.as_str(), last_name);
    }
    if let Some(email) = email {
        response = response.header(ctx.headers.email.as_str(), email);
    }
    Ok(response)
}
