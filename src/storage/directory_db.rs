// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant directory backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `credentials`: normalised e-mail → serialized CredentialRecord
//! - `tenants`: user_id → serialized TenantDescriptor

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::models::{normalize_email, UserId};
use crate::tenancy::directory::DirectoryResult;
use crate::tenancy::{CredentialRecord, TenantDescriptor, TenantDirectory};

// =============================================================================
// Table Definitions
// =============================================================================

/// e-mail → serialized CredentialRecord (JSON bytes).
const CREDENTIALS: TableDefinition<&str, &[u8]> = TableDefinition::new("credentials");

/// user_id → serialized TenantDescriptor (JSON bytes).
const TENANTS: TableDefinition<&str, &[u8]> = TableDefinition::new("tenants");

// =============================================================================
// DirectoryDb
// =============================================================================

/// Embedded system of record for credentials and tenant descriptors.
pub struct DirectoryDb {
    db: Database,
}

impl DirectoryDb {
    /// Open (or create) the directory at the given path.
    pub fn open(path: &Path) -> DirectoryResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CREDENTIALS)?;
            let _ = write_txn.open_table(TENANTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert or replace a credential. The e-mail is normalised first.
    pub fn upsert_credential(&self, record: &CredentialRecord) -> DirectoryResult<()> {
        let mut record = record.clone();
        record.email = normalize_email(&record.email);
        let json = serde_json::to_vec(&record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CREDENTIALS)?;
            table.insert(record.email.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Insert or replace a tenant descriptor.
    pub fn upsert_tenant(&self, descriptor: &TenantDescriptor) -> DirectoryResult<()> {
        let json = serde_json::to_vec(descriptor)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TENANTS)?;
            table.insert(descriptor.user_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Write a credential and its tenant descriptor in one transaction.
    pub fn upsert_account(
        &self,
        record: &CredentialRecord,
        descriptor: &TenantDescriptor,
    ) -> DirectoryResult<()> {
        let mut record = record.clone();
        record.email = normalize_email(&record.email);
        let credential_json = serde_json::to_vec(&record)?;
        let tenant_json = serde_json::to_vec(descriptor)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut tenants = write_txn.open_table(TENANTS)?;
            tenants.insert(descriptor.user_id.as_str(), tenant_json.as_slice())?;
            let mut credentials = write_txn.open_table(CREDENTIALS)?;
            credentials.insert(record.email.as_str(), credential_json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl TenantDirectory for DirectoryDb {
    fn get_credential(&self, email: &str) -> DirectoryResult<Option<CredentialRecord>> {
        let email = normalize_email(email);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CREDENTIALS)?;
        match table.get(email.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn get_tenant_descriptor(&self, user_id: &UserId) -> DirectoryResult<Option<TenantDescriptor>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TENANTS)?;
        match table.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_tenants(&self) -> DirectoryResult<Vec<TenantDescriptor>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TENANTS)?;

        let mut tenants = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            tenants.push(serde_json::from_slice(value.value())?);
        }
        Ok(tenants)
    }

    fn ping(&self) -> DirectoryResult<()> {
        let read_txn = self.db.begin_read()?;
        read_txn.open_table(TENANTS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_db() -> (DirectoryDb, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = DirectoryDb::open(&dir.path().join("directory.redb")).unwrap();
        (db, dir)
    }

    fn descriptor(id: &str) -> TenantDescriptor {
        TenantDescriptor {
            user_id: UserId::new(id),
            host: "db.internal".to_string(),
            port: 5432,
            database: format!("tenant_{id}"),
            username: format!("tenant_{id}"),
            password: "s3cret".to_string(),
        }
    }

    #[test]
    fn credential_lookup_is_normalised() {
        let (db, _dir) = temp_db();
        db.upsert_credential(&CredentialRecord {
            user_id: UserId::new("u1"),
            email: " A@X.com".to_string(),
            password_hash: "$2b$04$hash".to_string(),
        })
        .unwrap();

        let found = db.get_credential("a@x.COM").unwrap().unwrap();
        assert_eq!(found.user_id.as_str(), "u1");
        assert_eq!(found.email, "a@x.com");
        assert!(db.get_credential("b@x.com").unwrap().is_none());
    }

    #[test]
    fn tenant_upsert_and_lookup() {
        let (db, _dir) = temp_db();
        db.upsert_tenant(&descriptor("u1")).unwrap();

        let found = db.get_tenant_descriptor(&UserId::new("u1")).unwrap();
        assert_eq!(found, Some(descriptor("u1")));
        assert!(db
            .get_tenant_descriptor(&UserId::new("u2"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn account_upsert_writes_both_tables() {
        let (db, _dir) = temp_db();
        let credential = CredentialRecord {
            user_id: UserId::new("u1"),
            email: "A@x.com".to_string(),
            password_hash: "$2b$04$hash".to_string(),
        };
        db.upsert_account(&credential, &descriptor("u1")).unwrap();

        let found = db.get_credential("a@x.com").unwrap().unwrap();
        assert_eq!(found.user_id.as_str(), "u1");
        assert_eq!(
            db.get_tenant_descriptor(&found.user_id).unwrap(),
            Some(descriptor("u1"))
        );
    }

    #[test]
    fn tenant_upsert_replaces() {
        let (db, _dir) = temp_db();
        db.upsert_tenant(&descriptor("u1")).unwrap();

        let mut moved = descriptor("u1");
        moved.host = "db2.internal".to_string();
        db.upsert_tenant(&moved).unwrap();

        let found = db.get_tenant_descriptor(&UserId::new("u1")).unwrap().unwrap();
        assert_eq!(found.host, "db2.internal");
        assert_eq!(db.list_tenants().unwrap().len(), 1);
    }

    #[test]
    fn list_tenants_returns_all() {
        let (db, _dir) = temp_db();
        for id in ["u1", "u2", "u3"] {
            db.upsert_tenant(&descriptor(id)).unwrap();
        }

        let mut ids: Vec<String> = db
            .list_tenants()
            .unwrap()
            .into_iter()
            .map(|d| d.user_id.to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["u1", "u2", "u3"]);
    }

    #[test]
    fn reopen_keeps_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("directory.redb");
        {
            let db = DirectoryDb::open(&path).unwrap();
            db.upsert_tenant(&descriptor("u1")).unwrap();
        }
        let db = DirectoryDb::open(&path).unwrap();
        db.ping().unwrap();
        assert!(db.get_tenant_descriptor(&UserId::new("u1")).unwrap().is_some());
    }
}
