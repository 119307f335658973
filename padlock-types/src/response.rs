use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing_error::SpanTrace;

use crate::error::{ApiError, ErrorBody, StatusCode};

/// Response from a handler. The request-mapper middleware wraps it in the
/// [`Envelope`] before it goes back over the wire.
#[derive(Debug)]
pub struct Response {
    /// JSON payload, placed under the envelope `data` member.
    pub data: Option<Value>,
    /// Extra response headers, e.g. the identity headers emitted by the
    /// authentication subsystem.
    pub headers: Vec<(String, String)>,
}

impl Response {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            data: None,
            headers: Vec::new(),
        }
    }

    /// Construct a response with a payload that is returned as is to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if it fails to serialize the payload.
    pub fn raw<T: Serialize>(data: T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(data).map(|data| Self {
            data: Some(data),
            headers: Vec::new(),
        })
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Try to deserialize the payload from the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response has no payload or the payload does not
    /// deserialize into the requested type.
    pub fn data<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let data = self.data.ok_or_else(|| ApiError {
            error: anyhow::Error::msg("expected a data payload, found none"),
            status_code: StatusCode::BAD_REQUEST,
            span_trace: Some(SpanTrace::capture()),
        })?;
        serde_json::from_value(data).map_err(|err| ApiError {
            error: err.into(),
            status_code: StatusCode::BAD_REQUEST,
            span_trace: Some(SpanTrace::capture()),
        })
    }
}

/// Wire envelope carried by every response of every subsystem.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Envelope {
    #[must_use]
    pub fn success(request_id: String, data: Option<Value>) -> Self {
        Self {
            success: true,
            request_id,
            data,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(request_id: String, error: &ApiError) -> Self {
        Self {
            success: false,
            request_id,
            data: None,
            error: Some(error.body()),
        }
    }
}
