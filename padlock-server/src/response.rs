use hyper::{header::CONTENT_TYPE, Body, StatusCode};
use padlock_types::{
    error::ApiError,
    response::{Envelope, Response},
};

/// Wrap a handler response in the envelope and emit it, echoing the
/// correlation id and any handler-set headers.
pub fn success_response(
    resp: Response,
    request_id: &str,
    request_id_header: &str,
) -> hyper::Response<Body> {
    let envelope = Envelope::success(request_id.to_string(), resp.data);
    let body = match serde_json::to_vec(&envelope) {
        Ok(body) => body,
        Err(_) => return error_response(&ApiError::internal_error(), request_id, request_id_header),
    };

    let mut builder = hyper::Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .header(request_id_header, request_id);
    for (name, value) in &resp.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match builder.body(body.into()) {
        Ok(resp) => resp,
        Err(_) => error_response(&ApiError::internal_error(), request_id, request_id_header),
    }
}

/// Emit an error as the envelope with `success: false`.
pub fn error_response(
    err: &ApiError,
    request_id: &str,
    request_id_header: &str,
) -> hyper::Response<Body> {
    let envelope = Envelope::failure(request_id.to_string(), err);
    let body = serde_json::to_vec(&envelope)
        .unwrap_or_else(|_| br#"{"success":false}"#.to_vec());

    hyper::Response::builder()
        .status(err.status_code)
        .header(CONTENT_TYPE, "application/json")
        .header(request_id_header, request_id)
        .body(body.into())
        .expect("a valid response")
}
