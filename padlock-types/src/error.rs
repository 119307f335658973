use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::StatusCode;
use tracing_error::SpanTrace;

/// A shared error type used to produce the public error envelope and add
/// additional context for internal diagnostics. The public payload is built
/// from the inner error [`Display`] implementation and the `status_code`
/// field. The internal error report is created from the [`Debug`]
/// implementation and the `span_trace` field.
#[derive(Error, Debug)]
pub struct ApiError {
    // Only the Display format of the source error is returned to the client.
    #[source]
    pub error: anyhow::Error,
    pub status_code: StatusCode,
    pub span_trace: Option<SpanTrace>,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let report = self.report();
        // Using Debug impl here in Display impl because ApiError
        // doesn't need the Display impl
        write!(f, "{report:?}")
    }
}

#[derive(Debug)]
pub struct Report {
    pub cause: String,
    pub span_trace: Option<SpanTrace>,
}

impl ApiError {
    #[must_use]
    pub fn bad_request() -> Self {
        Self {
            error: anyhow::Error::msg("Bad request"),
            status_code: StatusCode::BAD_REQUEST,
            span_trace: Some(SpanTrace::capture()),
        }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self {
            error: anyhow::Error::msg("Token is no longer active"),
            status_code: StatusCode::UNAUTHORIZED,
            span_trace: Some(SpanTrace::capture()),
        }
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self {
            error: anyhow::Error::msg("Caller is not allowed to perform this call"),
            status_code: StatusCode::FORBIDDEN,
            span_trace: Some(SpanTrace::capture()),
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self {
            error: anyhow::Error::msg("Not found"),
            status_code: StatusCode::NOT_FOUND,
            span_trace: Some(SpanTrace::capture()),
        }
    }

    #[must_use]
    pub fn internal_error() -> Self {
        Self {
            error: anyhow::Error::msg("Internal error"),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            span_trace: Some(SpanTrace::capture()),
        }
    }

    #[must_use]
    pub fn report(&self) -> Report {
        Report {
            cause: format!("{:?}", self.error.root_cause()),
            span_trace: self.span_trace.clone(),
        }
    }

    /// Public error object placed inside the response envelope.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.status_code.as_u16(),
            message: self
                .status_code
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            detail: self.error.to_string(),
        }
    }
}

/// The `error` member of the response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub detail: String,
}
