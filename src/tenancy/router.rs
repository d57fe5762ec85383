// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Connection router: authenticated identity → that tenant's live database.
//!
//! The registry is filled once at startup from the directory's tenant list.
//! After that it is read by every request; the only writer is the explicit
//! tenant refresh triggered by the provisioning process. Lock guards are
//! never held across `.await`.
//!
//! A lookup for an identity without an entry is `RouteNotFound`. There is no
//! default or fallback connection.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use redb::Database;
use tracing::{error, info};

use super::{TenancyError, TenancyResult, TenantDescriptor};
use crate::models::UserId;

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("invalid database name {0:?}")]
    InvalidDatabaseName(String),

    #[error("database {database} is already routed to user {owner}")]
    DatabaseShared { database: String, owner: UserId },

    #[error("failed to open tenant database: {0}")]
    Open(#[from] redb::DatabaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Live handle to one tenant's dedicated database.
///
/// Cloning is cheap; every clone shares the same underlying database.
#[derive(Clone)]
pub struct TenantConnection {
    user_id: UserId,
    database_name: String,
    db: Arc<Database>,
}

impl TenantConnection {
    pub fn new(user_id: UserId, database_name: impl Into<String>, db: Arc<Database>) -> Self {
        Self {
            user_id,
            database_name: database_name.into(),
            db,
        }
    }

    /// Identity this connection belongs to.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Whether both handles point at the same physical database.
    pub fn same_database(&self, other: &TenantConnection) -> bool {
        Arc::ptr_eq(&self.db, &other.db)
    }
}

impl fmt::Debug for TenantConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantConnection")
            .field("user_id", &self.user_id)
            .field("database_name", &self.database_name)
            .finish_non_exhaustive()
    }
}

/// Establishes a connection from a tenant descriptor.
pub trait TenantConnector: Send + Sync {
    fn connect(&self, descriptor: &TenantDescriptor) -> Result<TenantConnection, ConnectError>;
}

/// Registry of per-tenant connections, keyed by identity.
#[derive(Default)]
pub struct ConnectionRouter {
    routes: RwLock<HashMap<UserId, TenantConnection>>,
}

impl ConnectionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect every tenant in `descriptors`.
    ///
    /// A tenant that fails to connect is logged and left out; its requests
    /// will fail with `RouteNotFound` rather than stop the whole service.
    pub fn build(
        descriptors: impl IntoIterator<Item = TenantDescriptor>,
        connector: &dyn TenantConnector,
    ) -> Self {
        let router = Self::new();
        let mut failed = 0usize;

        for descriptor in descriptors {
            let result = router
                .check_unshared(&descriptor)
                .and_then(|()| connector.connect(&descriptor))
                .and_then(|connection| router.insert(connection));
            if let Err(e) = result {
                failed += 1;
                error!(
                    user_id = %descriptor.user_id,
                    database = %descriptor.database,
                    error = %e,
                    "Failed to connect tenant database"
                );
            }
        }

        info!(
            connected = router.len(),
            failed,
            "Connection router initialised"
        );
        router
    }

    /// Connection for `user_id`, or `RouteNotFound`.
    pub fn route(&self, user_id: &UserId) -> TenancyResult<TenantConnection> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        routes
            .get(user_id)
            .cloned()
            .ok_or_else(|| TenancyError::RouteNotFound(user_id.clone()))
    }

    /// Register (or replace) the connection for its own identity.
    ///
    /// Refuses a database that is already routed to a different identity.
    pub fn register(&self, connection: TenantConnection) -> Result<(), ConnectError> {
        self.insert(connection)
    }

    /// Bring the entry for `descriptor.user_id` in line with `descriptor`.
    ///
    /// Keeps the current handle when it already points at the same database;
    /// otherwise connects and swaps. Returns the connection now in use and
    /// whether it was replaced.
    pub fn refresh(
        &self,
        descriptor: &TenantDescriptor,
        connector: &dyn TenantConnector,
    ) -> Result<(TenantConnection, bool), ConnectError> {
        if let Ok(current) = self.route(&descriptor.user_id) {
            if current.database_name() == descriptor.database {
                return Ok((current, false));
            }
        }

        self.check_unshared(descriptor)?;
        let connection = connector.connect(descriptor)?;
        self.insert(connection.clone())?;
        Ok((connection, true))
    }

    pub fn len(&self) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_unshared(&self, descriptor: &TenantDescriptor) -> Result<(), ConnectError> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        match owner_of(&routes, &descriptor.database) {
            Some(owner) if *owner != descriptor.user_id => Err(ConnectError::DatabaseShared {
                database: descriptor.database.clone(),
                owner: owner.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn insert(&self, connection: TenantConnection) -> Result<(), ConnectError> {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(owner) = owner_of(&routes, connection.database_name()) {
            if *owner != connection.user_id {
                return Err(ConnectError::DatabaseShared {
                    database: connection.database_name.clone(),
                    owner: owner.clone(),
                });
            }
        }
        routes.insert(connection.user_id.clone(), connection);
        Ok(())
    }
}

fn owner_of<'a>(routes: &'a HashMap<UserId, TenantConnection>, database: &str) -> Option<&'a UserId> {
    routes
        .values()
        .find(|c| c.database_name == database)
        .map(|c| &c.user_id)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tempfile::TempDir;

    use super::*;

    /// Opens one redb file per database name inside a temp dir.
    pub struct TempConnector {
        pub dir: TempDir,
        pub connects: AtomicUsize,
    }

    impl TempConnector {
        pub fn new() -> Self {
            Self {
                dir: TempDir::new().expect("temp dir"),
                connects: AtomicUsize::new(0),
            }
        }
    }

    impl TenantConnector for TempConnector {
        fn connect(&self, descriptor: &TenantDescriptor) -> Result<TenantConnection, ConnectError> {
            if descriptor.database.contains('/') {
                return Err(ConnectError::InvalidDatabaseName(descriptor.database.clone()));
            }
            self.connects.fetch_add(1, Ordering::SeqCst);
            let path = self.dir.path().join(format!("{}.redb", descriptor.database));
            let db = Database::create(path)?;
            Ok(TenantConnection::new(
                descriptor.user_id.clone(),
                descriptor.database.clone(),
                Arc::new(db),
            ))
        }
    }
}
