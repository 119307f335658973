use std::{collections::HashMap, ops::Deref};

use padlock_types::error::{ApiError, StatusCode};
use serde::de::DeserializeOwned;
use tracing_error::SpanTrace;

use super::{FromRequest, Request};

/// The path parameter of an admin route (`/user/:id`, `/role/:name`).
/// Every parameterized route of this service carries exactly one segment,
/// so the extractor is not generic: a route that captured any other number
/// of segments reached the wrong handler, which is a wiring fault and not
/// a caller error.
#[derive(Debug)]
pub struct Path(pub String);

impl Deref for Path {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Path {
    #[tracing::instrument(level = "debug", name = "path_extractor", skip_all)]
    fn from_request(req: &mut Request) -> Result<Self, ApiError> {
        match req.params.as_slice() {
            [param] => Ok(Path(param.clone())),
            params => Err(ApiError {
                error: anyhow::anyhow!(
                    "route captured {} path segments where exactly one was expected",
                    params.len()
                ),
                status_code: StatusCode::INTERNAL_SERVER_ERROR,
                span_trace: Some(SpanTrace::capture()),
            }),
        }
    }
}

/// Optional query parameters, e.g. the role filter of the user listing.
/// An absent query string extracts the type's default rather than failing,
/// because every query parameter this service knows is optional.
#[derive(Debug)]
pub struct Query<T>(pub T);

impl<T> Deref for Query<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned + Default> FromRequest for Query<T> {
    #[tracing::instrument(level = "debug", name = "query_string_extractor", skip_all)]
    fn from_request(req: &mut Request) -> Result<Self, ApiError> {
        if req.query_string.is_empty() {
            return Ok(Query(T::default()));
        }
        serde_qs::from_str(&req.query_string)
            .map(Query)
            .map_err(|err| ApiError {
                error: anyhow::anyhow!("query string does not parse: {err}"),
                status_code: StatusCode::BAD_REQUEST,
                span_trace: Some(SpanTrace::capture()),
            })
    }
}

/// The request headers, keyed by lower-cased header name. The side-call
/// handlers read their forwarded parameters from configurable header names,
/// so they take the whole map instead of typed fields.
#[derive(Debug, Clone)]
pub struct Headers(pub HashMap<String, String>);

impl Headers {
    /// Case-insensitive lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

impl Deref for Headers {
    type Target = HashMap<String, String>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Headers {
    #[tracing::instrument(level = "debug", name = "headers_extractor", skip_all)]
    fn from_request(req: &mut Request) -> Result<Self, ApiError> {
        Ok(Self(req.headers.clone()))
    }
}
