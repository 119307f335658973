use std::ops::Deref;

use padlock_types::error::{ApiError, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing_error::SpanTrace;

use super::{FromRequest, Request};

/// JSON request body of an admin call. The admin surface only speaks JSON:
/// an explicitly different content type is refused before the payload is
/// touched, an absent body is refused outright, and parse failures carry
/// the parser's reason into the error envelope so the operator sees what
/// was wrong with the payload.
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<T> Deref for Json<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromRequest for Json<T> {
    #[tracing::instrument(level = "debug", name = "json_extractor", skip_all)]
    fn from_request(req: &mut Request) -> Result<Self, ApiError> {
        if let Some(content_type) = req.header("content-type") {
            let mime = content_type
                .split(';')
                .next()
                .unwrap_or(content_type)
                .trim();
            if !mime.eq_ignore_ascii_case("application/json") {
                return Err(bad_request(format!("unsupported content type `{mime}`")));
            }
        }
        if req.data.is_empty() {
            return Err(bad_request("a JSON body is required for this call".into()));
        }

        serde_json::from_slice(&req.data).map(Json).map_err(|err| {
            let expected_type_name = std::any::type_name::<T>();
            debug!(expected_type_name, %err, "JSON extraction failed");
            bad_request(format!("request body does not parse: {err}"))
        })
    }
}

fn bad_request(detail: String) -> ApiError {
    ApiError {
        error: anyhow::Error::msg(detail),
        status_code: StatusCode::BAD_REQUEST,
        span_trace: Some(SpanTrace::capture()),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::super::tests::request;
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Params {
        name: String,
    }

    #[test]
    fn parses_a_json_body() {
        let mut req = request();
        req.data = br#"{ "name": "reader" }"#.to_vec().into();
        req.headers
            .insert("content-type".into(), "application/json; charset=utf-8".into());

        let Json(params) = Json::<Params>::from_request(&mut req).unwrap();
        assert_eq!(params.name, "reader");
    }

    #[test]
    fn refuses_other_content_types() {
        let mut req = request();
        req.data = b"name: reader".to_vec().into();
        req.headers
            .insert("content-type".into(), "text/yaml".into());

        let err = Json::<Params>::from_request(&mut req).unwrap_err();
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
        assert!(err.error.to_string().contains("text/yaml"));
    }

    #[test]
    fn refuses_an_absent_body() {
        let mut req = request();
        let err = Json::<Params>::from_request(&mut req).unwrap_err();
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn reports_the_parse_failure() {
        let mut req = request();
        req.data = br#"{ "name": 42 }"#.to_vec().into();

        let err = Json::<Params>::from_request(&mut req).unwrap_err();
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
        assert!(err.error.to_string().contains("does not parse"));
    }
}
