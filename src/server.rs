// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process startup: logging, backend wiring, serving and shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::router;
use crate::auth::keys::{KeyError, SigningKeys};
use crate::auth::password::DEFAULT_HASH_COST;
use crate::bootstrap::{self, BootstrapError};
use crate::config::{Config, LogFormat, TlsPaths};
use crate::state::AppState;
use crate::storage::{DirectoryDb, LruTenantCache, RedbConnector, StoragePaths};
use crate::tenancy::directory::DirectoryError;
use crate::tenancy::{ConnectionRouter, TenantDirectory};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Time allowed for in-flight TLS connections to finish after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("logging setup failed: {0}")]
    Tracing(String),

    #[error("directory: {0}")]
    Directory(#[from] DirectoryError),

    #[error("bootstrap: {0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("signing key: {0}")]
    Key(#[from] KeyError),

    #[error("invalid bind address {addr}: {reason}")]
    BindAddress { addr: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("startup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(format: LogFormat) -> Result<(), StartupError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    result.map_err(|e| StartupError::Tracing(e.to_string()))
}

/// Wire every backend from `config` into the shared state.
pub async fn build_state(config: &Config) -> Result<AppState, StartupError> {
    let paths = StoragePaths::new(&config.data_dir);
    let directory = Arc::new(DirectoryDb::open(&paths.directory_db())?);
    info!(path = %paths.directory_db().display(), "Tenant directory opened");

    if let Some(path) = config.bootstrap_file.clone() {
        let entries = bootstrap::load(&path)?;
        let db = Arc::clone(&directory);
        let applied =
            tokio::task::spawn_blocking(move || bootstrap::apply(&db, entries, DEFAULT_HASH_COST))
                .await??;
        info!(path = %path.display(), applied, "Bootstrap accounts applied");
    }

    let keys = match &config.signing_key_path {
        Some(path) => SigningKeys::load_or_generate(path)?,
        None => SigningKeys::ephemeral()?,
    };

    let connector = Arc::new(RedbConnector::new(paths));
    let tenants = directory.list_tenants()?;
    let routes = ConnectionRouter::build(tenants, connector.as_ref());

    let cache = Arc::new(LruTenantCache::new(config.cache_capacity));

    let state = AppState::new(directory, cache, connector, routes, &keys, &config.auth);
    Ok(match &config.provisioning_key {
        Some(secret) => state.with_provisioning_key(secret),
        None => {
            info!("PROVISIONING_KEY not set; tenant refresh endpoint disabled");
            state
        }
    })
}

/// Build the state and serve until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<(), StartupError> {
    let state = build_state(&config).await?;
    let app = router(state);

    let bind = config.bind_address();
    let addr: SocketAddr = bind.parse().map_err(|e: std::net::AddrParseError| {
        StartupError::BindAddress {
            addr: bind.clone(),
            reason: e.to_string(),
        }
    })?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    match &config.tls {
        Some(tls) => serve_tls(addr, tls, app, shutdown).await?,
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(%addr, "Tenant gateway listening on http (docs at /docs)");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn serve_tls(
    addr: SocketAddr,
    tls: &TlsPaths,
    app: axum::Router,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    // Already installed is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;

    let handle = axum_server::Handle::new();
    let drain = handle.clone();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
    });

    info!(%addr, "Tenant gateway listening on https (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
    token.cancel();
}
