// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cache-aside resolution of tenant descriptors.
//!
//! ## Algorithm
//!
//! 1. Ping the cache. An unreachable cache fails the whole resolution; there
//!    is no directory-only fallback.
//! 2. `GET tenant:<user_id>`; a hit is deserialised and returned.
//! 3. On a miss, read the directory. A found descriptor is written back with
//!    no TTL and returned; an absent one is `TenantNotFound`.
//!
//! Steps run strictly in sequence. Concurrent logins for the same identity
//! may both miss and both write back; the value is identical either way.
//!
//! Entries never expire. A reprovisioned tenant is picked up only after
//! `invalidate` drops its key.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::directory::query;
use super::{
    CacheError, CacheService, TenancyError, TenancyResult, TenantDescriptor, TenantDirectory,
};
use crate::models::UserId;

/// Default bound for every cache or directory call.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(2);

fn cache_key(user_id: &UserId) -> String {
    format!("tenant:{user_id}")
}

/// Cache-aside front for the tenant directory.
pub struct TenantResolver {
    cache: Arc<dyn CacheService>,
    directory: Arc<dyn TenantDirectory>,
    timeout: Duration,
}

impl TenantResolver {
    pub fn new(cache: Arc<dyn CacheService>, directory: Arc<dyn TenantDirectory>) -> Self {
        Self {
            cache,
            directory,
            timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the descriptor for `user_id`, reading through the cache.
    pub async fn resolve(&self, user_id: &UserId) -> TenancyResult<TenantDescriptor> {
        self.bounded("cache ping", self.cache.ping()).await?;

        let key = cache_key(user_id);
        if let Some(raw) = self.bounded("cache get", self.cache.get(&key)).await? {
            match serde_json::from_str::<TenantDescriptor>(&raw) {
                Ok(descriptor) if descriptor.user_id == *user_id => {
                    debug!(user_id = %user_id, "Tenant descriptor served from cache");
                    return Ok(descriptor);
                }
                Ok(descriptor) => {
                    warn!(
                        user_id = %user_id,
                        cached_owner = %descriptor.user_id,
                        "Cached tenant descriptor belongs to another user, dropping it"
                    );
                    self.bounded("cache delete", self.cache.delete(&key)).await?;
                }
                Err(e) => {
                    warn!(
                        user_id = %user_id,
                        error = %e,
                        "Undecodable tenant descriptor in cache, dropping it"
                    );
                    self.bounded("cache delete", self.cache.delete(&key)).await?;
                }
            }
        }

        let descriptor = self.lookup_directory(user_id).await?;

        let serialized = serde_json::to_string(&descriptor)
            .map_err(|e| TenancyError::Cache(CacheError::Operation(e.to_string())))?;
        self.bounded("cache set", self.cache.set(&key, serialized))
            .await?;
        debug!(user_id = %user_id, "Tenant descriptor cached");

        Ok(descriptor)
    }

    /// Read the descriptor straight from the directory, bypassing the cache.
    pub async fn lookup_directory(&self, user_id: &UserId) -> TenancyResult<TenantDescriptor> {
        let id = user_id.clone();
        query(
            &self.directory,
            "tenant directory lookup",
            self.timeout,
            move |directory| directory.get_tenant_descriptor(&id),
        )
        .await?
        .ok_or_else(|| TenancyError::TenantNotFound(user_id.clone()))
    }

    /// Drop the cached descriptor for `user_id`. Returns whether one existed.
    ///
    /// Called by the provisioning process after a tenant is moved.
    pub async fn invalidate(&self, user_id: &UserId) -> TenancyResult<bool> {
        self.bounded("cache delete", self.cache.delete(&cache_key(user_id)))
            .await
    }

    /// Liveness of the cache, for health reporting.
    pub async fn cache_ping(&self) -> TenancyResult<()> {
        self.bounded("cache ping", self.cache.ping()).await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, CacheError>>,
    ) -> TenancyResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(TenancyError::from),
            Err(_) => Err(TenancyError::Timeout {
                operation,
                timeout: self.timeout,
            }),
        }
    }
}
