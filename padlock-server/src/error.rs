use std::fmt::Display;

use padlock_types::{
    error::{ApiError, StatusCode},
    request::Method,
};
use sqlx::{error::DatabaseError, sqlite::SqliteError};
use thiserror::Error;
use tracing_error::SpanTrace;

#[derive(Error, Debug)]
pub enum ErrorType {
    #[error("Internal error")]
    Storage(sqlx::Error),
    #[error("Internal error")]
    InternalError(anyhow::Error),
    #[error("Internal error")]
    BadResponseData(#[source] serde_json::Error),
    #[error("{0}")]
    MalformedInput(String),
    #[error("`{path}` is not a valid request path")]
    MalformedPath { path: String },
    #[error("Token is no longer active")]
    AuthenticationFailed,
    #[error("User `{user_id}` has none of the required permissions")]
    NotAuthorized { user_id: String },
    #[error("User `{user_id}` is not known")]
    UnknownUser { user_id: String },
    #[error("No authorization rule matches host `{host}` path `{path}` method `{method}`")]
    UnmatchedSurface {
        host: String,
        path: String,
        method: Method,
    },
    #[error("Role `{role}` is not defined")]
    UnknownRole { role: String },
    #[error("{0}")]
    NotFound(String),
    #[error("A resource with that identifier already exists")]
    UniqueConstraintViolation {
        #[source]
        error: sqlx::Error,
    },
    #[error("The resource update was not processable")]
    ForeignKeyViolation {
        #[source]
        error: sqlx::Error,
    },
    #[error("No signing key associated with key id `{kid}`")]
    UnknownSigningKey { kid: String },
    #[error("Bearer token could not be verified")]
    InvalidToken,
    #[error("Token introspection failed")]
    IntrospectionFailed(#[source] anyhow::Error),
    #[error("Request to `{url}` failed")]
    Upstream {
        #[source]
        error: anyhow::Error,
        url: String,
    },
}

#[derive(Error, Debug)]
pub struct Error {
    pub variant: ErrorType,
    pub span_trace: SpanTrace,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.variant, self.span_trace)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        #[allow(clippy::redundant_closure_for_method_calls)]
        if let Some(error_code) = err
            .as_database_error()
            .and_then(|db_err| db_err.try_downcast_ref::<SqliteError>())
        {
            if let Some(code) = error_code.code().map(|str| str.to_string()) {
                match &code[..] {
                    // FK constraint violation
                    "787" => {
                        return Self {
                            variant: ErrorType::ForeignKeyViolation { error: err },
                            span_trace: SpanTrace::capture(),
                        };
                    }
                    // UNIQUE / PRIMARY KEY constraint violation
                    "1555" | "2067" => {
                        return Self {
                            variant: ErrorType::UniqueConstraintViolation { error: err },
                            span_trace: SpanTrace::capture(),
                        };
                    }
                    _ => {}
                }
            }
        }
        Self {
            variant: ErrorType::Storage(err),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<ErrorType> for Error {
    fn from(err: ErrorType) -> Self {
        Self {
            variant: err,
            span_trace: SpanTrace::capture(),
        }
    }
}

impl Error {
    /// Whether the error is a duplicate-row violation. The losing side of a
    /// concurrent auto-add race sees this and treats it as success.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self.variant, ErrorType::UniqueConstraintViolation { .. })
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status_code = match err.variant {
            ErrorType::Storage(_)
            | ErrorType::InternalError(_)
            | ErrorType::BadResponseData(_)
            | ErrorType::IntrospectionFailed(_)
            | ErrorType::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::MalformedInput(_)
            | ErrorType::MalformedPath { .. }
            | ErrorType::UnmatchedSurface { .. }
            | ErrorType::UnknownRole { .. }
            | ErrorType::UnknownSigningKey { .. }
            | ErrorType::InvalidToken => StatusCode::BAD_REQUEST,
            ErrorType::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            ErrorType::NotAuthorized { .. } | ErrorType::UnknownUser { .. } => {
                StatusCode::FORBIDDEN
            }
            ErrorType::NotFound(_) => StatusCode::NOT_FOUND,
            ErrorType::UniqueConstraintViolation { .. } => StatusCode::CONFLICT,
            ErrorType::ForeignKeyViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };

        ApiError {
            error: err.variant.into(),
            status_code,
            span_trace: Some(err.span_trace),
        }
    }
}
