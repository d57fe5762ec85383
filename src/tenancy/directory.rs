// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant directory: the system of record for credentials and tenant
//! connection descriptors.

use std::sync::Arc;
use std::time::Duration;

use super::{CredentialRecord, TenancyError, TenancyResult, TenantDescriptor};
use crate::models::UserId;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Synchronous query interface over the durable store.
///
/// Absence is `Ok(None)`; every other failure is a `DirectoryError`.
pub trait TenantDirectory: Send + Sync {
    /// Look up a credential by normalised login e-mail.
    fn get_credential(&self, email: &str) -> DirectoryResult<Option<CredentialRecord>>;

    /// Look up the descriptor of the tenant owned by `user_id`.
    fn get_tenant_descriptor(&self, user_id: &UserId) -> DirectoryResult<Option<TenantDescriptor>>;

    /// Every provisioned tenant. Used once at startup to build the router.
    fn list_tenants(&self) -> DirectoryResult<Vec<TenantDescriptor>>;

    /// Cheap read probe for health checks.
    fn ping(&self) -> DirectoryResult<()>;
}

/// Run a directory query on the blocking pool, bounded by `timeout`.
pub async fn query<T, F>(
    directory: &Arc<dyn TenantDirectory>,
    operation: &'static str,
    timeout: Duration,
    f: F,
) -> TenancyResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn TenantDirectory) -> DirectoryResult<T> + Send + 'static,
{
    let directory = Arc::clone(directory);
    let task = tokio::task::spawn_blocking(move || f(directory.as_ref()));

    match tokio::time::timeout(timeout, task).await {
        Err(_) => Err(TenancyError::Timeout { operation, timeout }),
        Ok(Err(join)) => Err(DirectoryError::Unavailable(join.to_string()).into()),
        Ok(Ok(result)) => result.map_err(TenancyError::from),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryDirectory;
    use super::*;

    struct SlowDirectory;

    impl TenantDirectory for SlowDirectory {
        fn get_credential(&self, _email: &str) -> DirectoryResult<Option<CredentialRecord>> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(None)
        }

        fn get_tenant_descriptor(&self, _: &UserId) -> DirectoryResult<Option<TenantDescriptor>> {
            Ok(None)
        }

        fn list_tenants(&self) -> DirectoryResult<Vec<TenantDescriptor>> {
            Ok(Vec::new())
        }

        fn ping(&self) -> DirectoryResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn query_times_out() {
        let directory: Arc<dyn TenantDirectory> = Arc::new(SlowDirectory);
        let result = query(&directory, "get_credential", Duration::from_millis(10), |d| {
            d.get_credential("a@x.com")
        })
        .await;
        assert!(matches!(result, Err(TenancyError::Timeout { .. })));
    }

    #[tokio::test]
    async fn query_surfaces_store_errors() {
        let memory = MemoryDirectory::default();
        memory.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        let directory: Arc<dyn TenantDirectory> = Arc::new(memory);

        let result = query(&directory, "list_tenants", Duration::from_secs(1), |d| {
            d.list_tenants()
        })
        .await;
        assert!(matches!(result, Err(TenancyError::Directory(_))));
    }
}
