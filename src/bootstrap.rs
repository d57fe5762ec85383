// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Seed accounts loaded from `BOOTSTRAP_FILE` at startup.
//!
//! ```json
//! [
//!   {
//!     "email": "a@x.com",
//!     "password": "p1",
//!     "tenant": { "host": "localhost", "port": 0, "database": "tenant_a",
//!                 "username": "a", "password": "pw" }
//!   }
//! ]
//! ```
//!
//! `user_id` is optional; an entry without one reuses the id already stored
//! for that e-mail, or gets a fresh one. An identity is never reassigned: an
//! entry naming a different `user_id` for a stored e-mail is rejected.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::auth::password::hash_password;
use crate::auth::AuthError;
use crate::models::{normalize_email, UserId};
use crate::storage::DirectoryDb;
use crate::tenancy::directory::DirectoryError;
use crate::tenancy::{CredentialRecord, TenantDescriptor, TenantDirectory};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to read bootstrap file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid bootstrap file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("bootstrap entry {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },

    #[error("failed to hash bootstrap password: {0}")]
    Hash(AuthError),

    #[error("directory write failed: {0}")]
    Directory(#[from] DirectoryError),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapTenant {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapEntry {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub tenant: BootstrapTenant,
}

impl fmt::Debug for BootstrapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapEntry")
            .field("email", &self.email)
            .field("user_id", &self.user_id)
            .field("database", &self.tenant.database)
            .finish_non_exhaustive()
    }
}

/// Parse the bootstrap file.
pub fn load(path: &Path) -> Result<Vec<BootstrapEntry>, BootstrapError> {
    let raw = std::fs::read(path)?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Upsert every entry into the directory. Returns the number applied.
pub fn apply(
    directory: &DirectoryDb,
    entries: Vec<BootstrapEntry>,
    hash_cost: u32,
) -> Result<usize, BootstrapError> {
    let count = entries.len();

    for (index, entry) in entries.into_iter().enumerate() {
        let email = normalize_email(&entry.email);
        if email.is_empty() {
            return Err(BootstrapError::InvalidEntry {
                index,
                reason: "email is empty".to_string(),
            });
        }
        if entry.password.is_empty() {
            return Err(BootstrapError::InvalidEntry {
                index,
                reason: "password is empty".to_string(),
            });
        }

        let existing = directory.get_credential(&email)?.map(|c| c.user_id);
        let user_id = match (existing, entry.user_id) {
            (Some(stored), Some(requested)) if stored != requested => {
                return Err(BootstrapError::InvalidEntry {
                    index,
                    reason: format!("{email} is already bound to user {stored}"),
                });
            }
            (Some(stored), _) => stored,
            (None, Some(requested)) => requested,
            (None, None) => UserId::generate(),
        };

        let password_hash =
            hash_password(&entry.password, hash_cost).map_err(BootstrapError::Hash)?;

        let credential = CredentialRecord {
            user_id: user_id.clone(),
            email,
            password_hash,
        };
        let tenant = TenantDescriptor {
            user_id: user_id.clone(),
            host: entry.tenant.host,
            port: entry.tenant.port,
            database: entry.tenant.database,
            username: entry.tenant.username,
            password: entry.tenant.password,
        };
        directory.upsert_account(&credential, &tenant)?;

        info!(user_id = %user_id, "Bootstrap account applied");
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use tempfile::TempDir;

    const FILE: &str = r#"[
        {
            "email": "A@x.com",
            "password": "p1",
            "user_id": "u1",
            "tenant": {"host": "localhost", "port": 0, "database": "tenant_u1",
                       "username": "u1", "password": "pw"}
        },
        {
            "email": "b@x.com",
            "password": "p2",
            "tenant": {"host": "localhost", "port": 0, "database": "tenant_b",
                       "username": "b", "password": "pw"}
        }
    ]"#;

    fn setup() -> (DirectoryDb, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = DirectoryDb::open(&dir.path().join("directory.redb")).unwrap();
        (db, dir)
    }

    fn write_file(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("bootstrap.json");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn apply_upserts_credentials_and_tenants() {
        let (db, dir) = setup();
        let entries = load(&write_file(&dir, FILE)).unwrap();

        assert_eq!(apply(&db, entries, 4).unwrap(), 2);

        let credential = db.get_credential("a@x.com").unwrap().unwrap();
        assert_eq!(credential.user_id.as_str(), "u1");
        assert!(verify_password("p1", &credential.password_hash).is_ok());

        let tenant = db.get_tenant_descriptor(&credential.user_id).unwrap().unwrap();
        assert_eq!(tenant.database, "tenant_u1");

        let generated = db.get_credential("b@x.com").unwrap().unwrap();
        assert!(generated.user_id.as_str().starts_with("usr_"));
    }

    #[test]
    fn reapplying_keeps_generated_ids() {
        let (db, dir) = setup();
        let path = write_file(&dir, FILE);

        apply(&db, load(&path).unwrap(), 4).unwrap();
        let first = db.get_credential("b@x.com").unwrap().unwrap().user_id;
        apply(&db, load(&path).unwrap(), 4).unwrap();
        let second = db.get_credential("b@x.com").unwrap().unwrap().user_id;

        assert_eq!(first, second);
        assert_eq!(db.list_tenants().unwrap().len(), 2);
    }

    #[test]
    fn stored_email_cannot_move_to_another_identity() {
        let (db, dir) = setup();
        apply(&db, load(&write_file(&dir, FILE)).unwrap(), 4).unwrap();

        let path = write_file(
            &dir,
            r#"[{"email":"a@x.com","password":"p1","user_id":"u_other",
                 "tenant":{"host":"localhost","port":0,"database":"tenant_u1",
                           "username":"u1","password":"pw"}}]"#,
        );
        let result = apply(&db, load(&path).unwrap(), 4);
        assert!(matches!(result, Err(BootstrapError::InvalidEntry { index: 0, .. })));

        assert_eq!(db.get_credential("a@x.com").unwrap().unwrap().user_id.as_str(), "u1");
        assert!(db.get_tenant_descriptor(&UserId::new("u_other")).unwrap().is_none());
        assert_eq!(db.list_tenants().unwrap().len(), 2);
    }

    #[test]
    fn same_identity_can_be_reapplied() {
        let (db, dir) = setup();
        let path = write_file(&dir, FILE);
        apply(&db, load(&path).unwrap(), 4).unwrap();
        assert_eq!(apply(&db, load(&path).unwrap(), 4).unwrap(), 2);
        assert_eq!(db.get_credential("a@x.com").unwrap().unwrap().user_id.as_str(), "u1");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let (_db, dir) = setup();
        let path = write_file(
            &dir,
            r#"[{"email":"a@x.com","password":"p1","role":"admin",
                 "tenant":{"host":"h","port":1,"database":"d","username":"u","password":"p"}}]"#,
        );
        assert!(matches!(load(&path), Err(BootstrapError::Parse(_))));
    }

    #[test]
    fn empty_password_is_rejected() {
        let (db, dir) = setup();
        let path = write_file(
            &dir,
            r#"[{"email":"a@x.com","password":"",
                 "tenant":{"host":"h","port":1,"database":"d","username":"u","password":"p"}}]"#,
        );
        let result = apply(&db, load(&path).unwrap(), 4);
        assert!(matches!(result, Err(BootstrapError::InvalidEntry { index: 0, .. })));
    }

    #[test]
    fn debug_hides_passwords() {
        let (_db, dir) = setup();
        let entries = load(&write_file(&dir, FILE)).unwrap();
        let rendered = format!("{entries:?}");
        assert!(!rendered.contains("p1"));
        assert!(!rendered.contains("\"pw\""));
    }
}
