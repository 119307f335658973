use std::{collections::HashMap, future::Future, pin::Pin, task::Poll};

use padlock_types::error::ApiError;
use padlock_types::request::{Method, Request};
use padlock_types::response::Response;
use tower::{util::BoxCloneService, Service};
use tower::{Layer, ServiceExt};

use super::handler::Handler;

#[derive(Debug, Clone)]
pub struct Route {
    handler: BoxCloneService<Request, Response, ApiError>,
}

impl Route {
    #[must_use]
    pub fn new(handler: BoxCloneService<Request, Response, ApiError>) -> Self {
        Self { handler }
    }
}

impl Service<Request> for Route {
    type Response = Response;

    type Error = ApiError;

    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.handler.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        self.handler.call(req)
    }
}

/// Routes a request to a handler based on its HTTP verb.
#[derive(Debug, Clone)]
pub struct MethodRouter {
    routes: HashMap<Method, Route>,
}

impl Default for MethodRouter {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! chained_handlers {
    ($method:ident, $register:ident) => {
        #[must_use]
        pub fn $register<H, T>(mut self, handler: H) -> Self
        where
            H: Handler<T>,
            T: Send + 'static,
        {
            self.routes.insert(Method::$method, handler.into_route());
            self
        }
    };
}

macro_rules! top_level_handlers {
    ($method:ident, $register:ident) => {
        #[must_use]
        pub fn $register<H, T>(handler: H) -> MethodRouter
        where
            H: Handler<T>,
            T: Send + 'static,
        {
            MethodRouter::new().on(Method::$method, handler)
        }
    };
}

top_level_handlers!(Get, get);
top_level_handlers!(Head, head);
top_level_handlers!(Put, put);
top_level_handlers!(Post, post);
top_level_handlers!(Patch, patch);
top_level_handlers!(Delete, delete);
top_level_handlers!(Options, options);

impl MethodRouter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: HashMap::default(),
        }
    }

    chained_handlers!(Get, get);
    chained_handlers!(Head, head);
    chained_handlers!(Put, put);
    chained_handlers!(Post, post);
    chained_handlers!(Patch, patch);
    chained_handlers!(Delete, delete);
    chained_handlers!(Options, options);

    #[must_use]
    pub fn on<H, T>(mut self, method: Method, handler: H) -> Self
    where
        H: Handler<T>,
        T: Send + 'static,
    {
        self.routes.insert(method, handler.into_route());
        self
    }

    #[must_use]
    pub fn layer<L>(self, layer: L) -> Self
    where
        L: Layer<Route>,
        L::Service:
            Service<Request, Error = ApiError, Response = Response> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        let routes = self
            .routes
            .into_iter()
            .map(|(method, route)| {
                let svc = layer.layer(route);
                let route = Route::new(BoxCloneService::new(svc));
                (method, route)
            })
            .collect();

        Self { routes }
    }
}

impl Service<Request> for MethodRouter {
    type Response = Response;

    type Error = ApiError;

    type Future = Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let route = self.routes.get(&req.method).map(Clone::clone);

        Box::pin(async move {
            match route {
                Some(route) => route.oneshot(req).await,
                None => Err(ApiError::not_found()),
            }
        })
    }
}
