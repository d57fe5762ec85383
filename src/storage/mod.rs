// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Concrete backends for the tenancy contracts:
//!
//! - `DirectoryDb` - redb system of record (credentials, tenant descriptors)
//! - `LruTenantCache` - in-process cache service for descriptors
//! - `RedbConnector` - opens each tenant's dedicated redb database
//!
//! ## Storage Layout
//!
//! ```text
//! <DATA_DIR>/
//!   directory.redb
//!   tenants/
//!     {database}.redb
//! ```

pub mod directory_db;
pub mod paths;
pub mod tenant_cache;
pub mod tenant_db;

pub use directory_db::DirectoryDb;
pub use paths::StoragePaths;
pub use tenant_cache::LruTenantCache;
pub use tenant_db::RedbConnector;
