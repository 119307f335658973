use std::{collections::HashMap, str::FromStr};

use bytes::Bytes;
use http::Extensions;
use http_body::Limited;
use hyper::Body;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Logical request handed to the routing layer. Produced from the raw hyper
/// request by the server's request-mapper middleware.
#[derive(Debug)]
pub struct Request {
    /// Correlation id echoed on the response. Taken from the configured
    /// request-id header when the caller supplied one, freshly minted
    /// otherwise.
    pub id: String,

    pub method: Method,

    pub path: String,

    pub query_string: String,

    pub data: Bytes,
    pub extensions: Extensions,
    pub params: Vec<String>,

    /// Header names are lower-cased by hyper.
    pub headers: HashMap<String, String>,
}

/// The HTTP verbs a side-call or admin call may carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Put,
    Post,
    Patch,
    Delete,
    Options,
}

impl FromStr for Method {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "PUT" => Ok(Self::Put),
            "POST" => Ok(Self::Post),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(ApiError::bad_request()),
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = ApiError;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        match *method {
            http::Method::GET => Ok(Self::Get),
            http::Method::HEAD => Ok(Self::Head),
            http::Method::PUT => Ok(Self::Put),
            http::Method::POST => Ok(Self::Post),
            http::Method::PATCH => Ok(Self::Patch),
            http::Method::DELETE => Ok(Self::Delete),
            http::Method::OPTIONS => Ok(Self::Options),
            _ => Err(ApiError::bad_request()),
        }
    }
}

impl Request {
    /// Create an internal logical request from a http request.
    ///
    /// # Errors
    ///
    /// Returns an error if the http request contains unsupported elements that
    /// cannot be converted to the logical request format.
    pub async fn new(
        raw: hyper::Request<Limited<Body>>,
        request_id_header: &str,
    ) -> Result<Self, ApiError> {
        let uri = raw.uri().clone();
        let method = Method::try_from(raw.method())?;

        let id = raw
            .headers()
            .get(request_id_header)
            .and_then(|val| val.to_str().ok())
            .filter(|val| !val.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);

        let headers = raw
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let bytes = hyper::body::to_bytes(raw.into_body())
            .await
            .map_err(|_| ApiError::bad_request())?;

        Ok(Self {
            id,
            method,
            path: uri.path().to_string(),
            query_string: uri.query().unwrap_or_default().to_string(),
            data: bytes,
            extensions: Extensions::new(),
            params: vec![],
            headers,
        })
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}
