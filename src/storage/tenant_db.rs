// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Connector for per-tenant embedded databases.
//!
//! Each tenant owns `<DATA_DIR>/tenants/{database}.redb`. The descriptor's
//! `database` is used as the file stem, so it is restricted to
//! `[A-Za-z0-9_-]`; host, port and credentials are carried for network
//! drivers and ignored here.

use std::sync::Arc;

use redb::Database;
use tracing::debug;

use super::StoragePaths;
use crate::tenancy::{ConnectError, TenantConnection, TenantConnector, TenantDescriptor};

/// Opens tenant databases under the data directory.
pub struct RedbConnector {
    paths: StoragePaths,
}

impl RedbConnector {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }
}

fn validate_database_name(name: &str) -> Result<(), ConnectError> {
    let valid = !name.is_empty()
        && name.len() <= 128
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConnectError::InvalidDatabaseName(name.to_string()))
    }
}

impl TenantConnector for RedbConnector {
    fn connect(&self, descriptor: &TenantDescriptor) -> Result<TenantConnection, ConnectError> {
        validate_database_name(&descriptor.database)?;

        std::fs::create_dir_all(self.paths.tenants_dir())?;
        let path = self.paths.tenant_db(&descriptor.database);
        let db = Database::create(&path)?;

        debug!(
            user_id = %descriptor.user_id,
            database = %descriptor.database,
            "Opened tenant database"
        );

        Ok(TenantConnection::new(
            descriptor.user_id.clone(),
            descriptor.database.clone(),
            Arc::new(db),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use tempfile::TempDir;

    fn descriptor(database: &str) -> TenantDescriptor {
        TenantDescriptor {
            user_id: UserId::new("u1"),
            host: "localhost".to_string(),
            port: 0,
            database: database.to_string(),
            username: "u1".to_string(),
            password: "pw".to_string(),
        }
    }

    #[test]
    fn connect_creates_tenant_file() {
        let dir = TempDir::new().unwrap();
        let paths = StoragePaths::new(dir.path());
        let connector = RedbConnector::new(paths.clone());

        let conn = connector.connect(&descriptor("tenant_u1")).unwrap();
        assert_eq!(conn.user_id().as_str(), "u1");
        assert_eq!(conn.database_name(), "tenant_u1");
        assert!(paths.tenant_db("tenant_u1").exists());
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        let connector = RedbConnector::new(StoragePaths::new(dir.path()));

        for bad in ["", "../x", "a/b", "a.b", "名前"] {
            let err = connector.connect(&descriptor(bad)).unwrap_err();
            assert!(matches!(err, ConnectError::InvalidDatabaseName(_)), "{bad}");
        }
    }
}
