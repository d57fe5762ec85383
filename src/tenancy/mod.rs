// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Tenancy
//!
//! Everything needed to get from an authenticated identity to that tenant's
//! dedicated database:
//!
//! - `directory` - system-of-record lookup (credentials, tenant descriptors)
//! - `cache` - cache service contract used for cache-aside resolution
//! - `resolver` - cache-aside resolution of tenant descriptors
//! - `router` - identity → live connection registry
//!
//! Concrete backends live in `crate::storage`.

use std::time::Duration;

pub mod cache;
pub mod descriptor;
pub mod directory;
pub mod resolver;
pub mod router;

pub use cache::{CacheError, CacheService};
pub use descriptor::{CredentialRecord, TenantDescriptor};
pub use directory::{DirectoryError, TenantDirectory};
pub use resolver::TenantResolver;
pub use router::{ConnectError, ConnectionRouter, TenantConnection, TenantConnector};

use crate::models::UserId;

/// Failures of the tenancy layer.
///
/// Converted into `AuthError` at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum TenancyError {
    #[error("cache unavailable: {0}")]
    Cache(#[from] CacheError),

    #[error("tenant directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("no tenant provisioned for user {0}")]
    TenantNotFound(UserId),

    #[error("no connection registered for user {0}")]
    RouteNotFound(UserId),

    #[error("connecting tenant failed: {0}")]
    Connect(#[from] ConnectError),
}

pub type TenancyResult<T> = Result<T, TenancyError>;
