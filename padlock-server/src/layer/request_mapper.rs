use std::convert::Infallible;
use std::sync::Arc;

use futures::future::BoxFuture;
use http_body::Limited;
use hyper::{http, Body};
use padlock_types::{error::ApiError, request::Request, response::Response};
use tower::{Layer, Service, ServiceExt};
use uuid::Uuid;

use crate::response::{error_response, success_response};

/// Converts raw hyper requests into logical [`Request`]s, assigns or echoes
/// the correlation id, and wraps handler output (or errors) in the response
/// envelope on the way out. Also emits the one `tracing` event every
/// side-call gets.
#[derive(Debug, Clone)]
pub struct RequestResponseService<S> {
    inner: S,
    request_id_header: Arc<str>,
}

impl<S> RequestResponseService<S> {
    pub fn new(inner: S, request_id_header: Arc<str>) -> Self {
        Self {
            inner,
            request_id_header,
        }
    }
}

impl<S> Service<http::Request<Limited<Body>>> for RequestResponseService<S>
where
    S: Service<Request, Response = Response, Error = ApiError> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = http::Response<Body>;

    type Error = Infallible;

    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<Limited<Body>>) -> Self::Future {
        let this = self.clone();
        Box::pin(async move {
            let logical_req = match Request::new(req, &this.request_id_header).await {
                Ok(req) => req,
                Err(error) => {
                    // The request never became a logical request, so there is
                    // no caller-supplied correlation id to echo.
                    let request_id = Uuid::new_v4().to_string();
                    return Ok(error_response(&error, &request_id, &this.request_id_header));
                }
            };

            let request_id = logical_req.id.clone();
            let method = logical_req.method;
            let path = logical_req.path.clone();

            match this.inner.oneshot(logical_req).await {
                Ok(resp) => {
                    tracing::info!(request_id, %method, path, status = 200_u16, "Handled call");
                    Ok(success_response(resp, &request_id, &this.request_id_header))
                }
                Err(error) => {
                    let status = error.status_code.as_u16();
                    let error_report = error.report();
                    if error.status_code.is_server_error() {
                        tracing::error!(request_id, %method, path, status, ?error_report, "Call failed");
                    } else {
                        tracing::info!(request_id, %method, path, status, ?error_report, "Call rejected");
                    }
                    Ok(error_response(&error, &request_id, &this.request_id_header))
                }
            }
        })
    }
}

pub struct RequestResponseLayer {
    request_id_header: Arc<str>,
}

impl RequestResponseLayer {
    pub fn new(request_id_header: &str) -> Self {
        Self {
            request_id_header: Arc::from(request_id_header),
        }
    }
}

impl<S> Layer<S> for RequestResponseLayer {
    type Service = RequestResponseService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestResponseService::new(inner, Arc::clone(&self.request_id_header))
    }
}
