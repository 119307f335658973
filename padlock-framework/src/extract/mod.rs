mod body;
mod params;

use std::{
    ops::Deref,
    task::{Context, Poll},
};

use padlock_types::{
    error::{ApiError, StatusCode},
    request::Request,
};
use tower::Service;
use tracing_error::SpanTrace;

pub use body::*;
pub use params::*;

pub trait FromRequest: Sized {
    /// Perform the extraction.
    ///
    /// # Errors
    ///
    /// Returns error if the extraction from the [`Request`] was unsuccessful.
    fn from_request(req: &mut Request) -> Result<Self, ApiError>;
}

/// Subsystem state (a handler context, the store handle) carried into the
/// request via its extensions. Doubles as the [`tower::Layer`] that installs
/// the value on every request of a router.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extension<T>(pub T);

impl<T> Deref for Extension<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> tower::Layer<S> for Extension<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Service = AddExtension<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        AddExtension {
            inner,
            value: self.0.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AddExtension<S, T> {
    pub(crate) inner: S,
    pub(crate) value: T,
}

impl<S, T> Service<Request> for AddExtension<S, T>
where
    S: Service<Request>,
    T: Clone + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        req.extensions.insert(self.value.clone());
        self.inner.call(req)
    }
}

impl<T> FromRequest for Extension<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A missing extension means the router was assembled without its
    /// context layer. That is a wiring fault inside this process, never a
    /// caller error, so it surfaces as an internal invariant violation.
    #[tracing::instrument(level = "debug", name = "extension_extractor", skip_all)]
    fn from_request(req: &mut Request) -> Result<Self, ApiError> {
        req.extensions
            .get::<T>()
            .map(|ext| Extension(ext.clone()))
            .ok_or_else(|| ApiError {
                error: anyhow::anyhow!(
                    "request context `{}` was not installed",
                    std::any::type_name::<T>()
                ),
                status_code: StatusCode::INTERNAL_SERVER_ERROR,
                span_trace: Some(SpanTrace::capture()),
            })
    }
}
