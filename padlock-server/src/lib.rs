#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![deny(clippy::pedantic)]
#![deny(clippy::get_unwrap)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod api;
mod checker;
mod config;
mod context;
mod error;
mod introspect;
mod layer;
mod matcher;
mod migrations;
mod oidc;
mod registry;
mod repos;
mod response;
mod token_cache;
mod users;

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

pub use config::*;
use futures::future::BoxFuture;
pub use oidc::OidcParams;
use padlock_framework::SyncService;
use padlock_types::{request::Request, response::Response};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::broadcast;
use tower::{make::Shared, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
};
use tracing::info;

use crate::{
    checker::Validators,
    context::{AdminContext, AuthenticateContext, AuthorizeContext, StoreHandle},
    introspect::Introspector,
    layer::request_mapper::RequestResponseLayer,
    matcher::GroupMatcher,
    oidc::OidcClient,
    registry::RoleRegistry,
    repos::Repos,
    token_cache::{clock::SystemClock, CacheSweeper, TokenCache},
    users::UserManager,
};

pub async fn shutdown_signal() {
    // Wait for the CTRL+C signal
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
}

pub async fn start(
    mut config: Config,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    config.sanitize()?;

    let listen_tx = config.listen_tx.take();
    let config = Arc::new(config);

    // Open the store. An in-memory store only exists on a single
    // connection, so the pool must not stripe across several.
    let mut pool_options = SqlitePoolOptions::new();
    if config.store.using_inmemory_storage() {
        pool_options = pool_options.min_connections(1).max_connections(1);
    }
    let pool = pool_options
        .connect_with(
            SqliteConnectOptions::new()
                .create_if_missing(true)
                .foreign_keys(true)
                .filename(&config.store.path),
        )
        .await?;
    let repos = Repos::new(pool);

    crate::migrations::migrate(&repos.pool)
        .await
        .map_err(|err| anyhow::anyhow!("store migration failed: {}", err.variant))?;

    let validators = Arc::new(
        Validators::new(&config.custom_validation_regex)
            .map_err(|err| anyhow::anyhow!("{}", err.variant))?,
    );

    // Reconcile the role registry with the store before any listener is up,
    // so every request observes the configured role set.
    let registry = Arc::new(RoleRegistry::new());
    registry
        .reconcile(&repos.user, &config.role_permissions())
        .await
        .map_err(|err| anyhow::anyhow!("role reconcile failed: {}", err.variant))?;
    let users = UserManager::new(repos.user.clone(), Arc::clone(&registry));
    let store = StoreHandle {
        repos: repos.clone(),
    };

    let (stop_tx, _) = broadcast::channel::<()>(1);
    let mut listen_addrs = ListenAddrs::default();
    let mut servers: Vec<BoxFuture<'static, Result<(), hyper::Error>>> = Vec::new();
    let mut sweeper: Option<Arc<CacheSweeper>> = None;

    if let Some(section) = config
        .user_management
        .as_ref()
        .filter(|section| section.enabled)
    {
        let ctx = AdminContext {
            users: users.clone(),
            registry: Arc::clone(&registry),
            validators: Arc::clone(&validators),
        };
        let service = api::new_user_management_service(&section.apis.prefix, ctx, store.clone());
        let (addr, server) = spawn_server(
            &section.service,
            &config.request_id_header,
            service,
            stop_tx.subscribe(),
        )?;
        info!(%addr, "User management listening");
        listen_addrs.user_management = Some(addr);
        servers.push(server);
    }

    if let Some(section) = config.authorize.as_ref().filter(|section| section.enabled) {
        let matcher = Arc::new(
            GroupMatcher::new(&section.rules)
                .map_err(|err| anyhow::anyhow!("rule tree failed to compile: {}", err.variant))?,
        );
        let ctx = AuthorizeContext {
            matcher,
            users: users.clone(),
            headers: Arc::new(section.request_param_headers.clone()),
            validators: Arc::clone(&validators),
            auto_add: section.for_unknown_user.auto_add,
        };
        let service = api::new_authorize_service(&section.apis.prefix, ctx, store.clone());
        let (addr, server) = spawn_server(
            &section.service,
            &config.request_id_header,
            service,
            stop_tx.subscribe(),
        )?;
        info!(%addr, "Authorization listening");
        listen_addrs.authorize = Some(addr);
        servers.push(server);
    }

    if let Some(section) = config
        .authenticate
        .as_ref()
        .filter(|section| section.enabled)
    {
        let oidc_params = section
            .oidc
            .clone()
            .ok_or_else(|| anyhow::anyhow!("authenticate requires OIDC issuer parameters"))?;
        let oidc = Arc::new(
            OidcClient::bootstrap(oidc_params)
                .await
                .map_err(|err| anyhow::anyhow!("OIDC bootstrap failed: {}", err.variant))?,
        );

        let introspector = if section.introspection.enabled {
            if !oidc.can_introspect() {
                return Err(anyhow::anyhow!(
                    "introspection is enabled but the issuer does not expose an introspection endpoint"
                ));
            }
            #[allow(clippy::cast_possible_wrap)]
            let cache = Arc::new(TokenCache::new(chrono::Duration::seconds(
                section.introspection.re_introspect_interval_sec as i64,
            )));
            let cache_sweeper = Arc::new(CacheSweeper::new(
                Arc::clone(&cache),
                SystemClock::new(),
                Duration::from_secs(section.introspection.cache_clean_interval_sec),
                Duration::from_secs(section.introspection.cache_purge_interval_sec),
            ));
            let worker = Arc::clone(&cache_sweeper);
            tokio::spawn(async move {
                worker.start().await;
            });
            sweeper = Some(cache_sweeper);

            Some(Introspector::new(
                cache,
                Arc::clone(&oidc),
                Arc::new(SystemClock::new()),
            ))
        } else {
            None
        };

        let ctx = AuthenticateContext {
            oidc,
            introspector,
            claims: Arc::new(section.target_claims.clone()),
            headers: Arc::new(section.request_param_headers.clone()),
        };
        let service = api::new_authenticate_service(&section.apis.prefix, ctx, store.clone());
        let (addr, server) = spawn_server(
            &section.service,
            &config.request_id_header,
            service,
            stop_tx.subscribe(),
        )?;
        info!(%addr, "Authentication listening");
        listen_addrs.authenticate = Some(addr);
        servers.push(server);
    }

    let shutdown_handler = {
        let stop_tx = stop_tx.clone();
        let sweeper = sweeper.clone();
        async move {
            shutdown_signal.await;
            info!("Shutdown signal received");
            if let Some(sweeper) = sweeper {
                sweeper.stop().await;
            }
            let _ = stop_tx.send(());
        }
    };
    tokio::spawn(shutdown_handler);

    if let Some(tx) = listen_tx {
        let _ = tx.send(listen_addrs);
    }

    // And run forever...
    if let Err(error) = futures::future::try_join_all(servers).await {
        tracing::error!(?error, "Encountered server error. Shutting down.");
        return Err(error.into());
    }
    Ok(())
}

fn spawn_server(
    service_config: &ServiceConfig,
    request_id_header: &str,
    service: SyncService<Request, Response>,
    mut stop_rx: broadcast::Receiver<()>,
) -> anyhow::Result<(SocketAddr, BoxFuture<'static, Result<(), hyper::Error>>)> {
    let stack = ServiceBuilder::new()
        .concurrency_limit(1000)
        .timeout(Duration::from_secs(service_config.write_timeout_sec))
        .layer(RequestBodyLimitLayer::new(1024 * 16))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
        .layer(RequestResponseLayer::new(request_id_header))
        .service(service);

    let addr = service_config.socket_addr()?;
    let server = hyper::Server::try_bind(&addr)?
        .http1_header_read_timeout(Duration::from_secs(service_config.read_timeout_sec))
        .tcp_keepalive(Some(Duration::from_secs(service_config.idle_timeout_sec)))
        .serve(Shared::new(stack));
    let local_addr = server.local_addr();
    let server = server.with_graceful_shutdown(async move {
        let _ = stop_rx.recv().await;
    });

    Ok((local_addr, Box::pin(server)))
}
