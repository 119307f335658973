use std::collections::BTreeSet;
use std::str::FromStr;

use padlock_framework::extract::{Extension, Headers};
use padlock_types::{request::Method, response::Response, user::UserConfig};

use crate::{
    context::AuthorizeContext,
    error::{Error, ErrorType},
    matcher::{normalize_path, MatchOutcome},
};

fn required_header<'a>(headers: &'a Headers, name: &str) -> Result<&'a str, Error> {
    headers
        .get(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ErrorType::MalformedInput(format!("missing `{name}` header")).into())
}

/// The authorization side-call: decide whether the proxied request described
/// by the forwarded headers is allowed for the given caller.
pub async fn handle_allow(
    Extension(ctx): Extension<AuthorizeContext>,
    headers: Headers,
) -> Result<Response, Error> {
    let user_id = required_header(&headers, &ctx.headers.user_id)?;
    let raw_method = required_header(&headers, &ctx.headers.method)?;
    let raw_path = required_header(&headers, &ctx.headers.uri)?;
    let host = required_header(&headers, &ctx.headers.host)?;

    let method = Method::from_str(raw_method).map_err(|_| {
        Error::from(ErrorType::MalformedInput(format!(
            "`{raw_method}` is not a permitted method"
        )))
    })?;
    if !ctx.validators.user_id.matches(user_id) {
        return Err(
            ErrorType::MalformedInput(format!("`{user_id}` is not a valid user id")).into(),
        );
    }
    if !ctx.validators.hostname.matches(host) {
        return Err(ErrorType::MalformedInput(format!("`{host}` is not a valid host")).into());
    }

    let path = normalize_path(raw_path)?;

    let allowed = match ctx.matcher.matches(host, &path, method) {
        MatchOutcome::Match(allowed) => allowed,
        MatchOutcome::NoMatch => {
            return Err(ErrorType::UnmatchedSurface {
                host: host.to_string(),
                path,
                method,
            }
            .into());
        }
    };

    match ctx.users.has_any_permission(user_id, &allowed).await {
        Ok(true) => Ok(Response::ok()),
        Ok(false) => {
            tracing::debug!(user_id, host, path, %method, "Surface matched but caller lacks permission");
            Err(ErrorType::NotAuthorized {
                user_id: user_id.to_string(),
            }
            .into())
        }
        Err(error) if matches!(error.variant, ErrorType::UnknownUser { .. }) => {
            if ctx.auto_add {
                auto_add_user(&ctx, &headers, user_id).await?;
            }
            Err(error)
        }
        Err(error) => Err(error),
    }
}

/// Record a previously-unseen caller so an operator can bind roles to it
/// later. The call is denied either way; a lost creation race means the row
/// already exists, which is just as good.
async fn auto_add_user(
    ctx: &AuthorizeContext,
    headers: &Headers,
    user_id: &str,
) -> Result<(), Error> {
    let optional = |name: &str| headers.get(name).map(ToString::to_string);
    let config = UserConfig {
        user_id: user_id.to_string(),
        username: optional(&ctx.headers.username),
        email: optional(&ctx.headers.email),
        first_name: optional(&ctx.headers.first_name),
        last_name: optional(&ctx.headers.last_name),
    };

    match ctx.users.define_user(&config, &BTreeSet::new()).await {
        Ok(_) => {
            tracing::info!(user_id, "Auto-added unknown caller");
            Ok(())
        }
        Err(error) if error.is_unique_violation() => Ok(()),
        Err(error) => Err(error),
    }
}
