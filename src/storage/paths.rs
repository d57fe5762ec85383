// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk layout.
//!
//! ```text
//! <DATA_DIR>/
//!   directory.redb          # credentials + tenant descriptors
//!   tenants/
//!     {database}.redb       # one dedicated database per tenant
//! ```

use std::path::{Path, PathBuf};

/// Default data directory.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tenant directory database.
    pub fn directory_db(&self) -> PathBuf {
        self.root.join("directory.redb")
    }

    /// Directory containing all tenant databases.
    pub fn tenants_dir(&self) -> PathBuf {
        self.root.join("tenants")
    }

    /// Database file of one tenant.
    pub fn tenant_db(&self, database: &str) -> PathBuf {
        self.tenants_dir().join(format!("{database}.redb"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_is_data() {
        assert_eq!(StoragePaths::default().root(), Path::new("/data"));
    }

    #[test]
    fn layout_under_root() {
        let paths = StoragePaths::new("/tmp/gw");
        assert_eq!(paths.directory_db(), PathBuf::from("/tmp/gw/directory.redb"));
        assert_eq!(
            paths.tenant_db("acme"),
            PathBuf::from("/tmp/gw/tenants/acme.redb")
        );
    }
}
