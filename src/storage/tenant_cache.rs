// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process LRU cache for serialized tenant descriptors.
//!
//! Entries have no TTL. They leave the cache only through an explicit
//! `delete` or when capacity forces an eviction, after which the next
//! resolution reads the directory again.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use async_trait::async_trait;
use lru::LruCache;

use crate::tenancy::{CacheError, CacheService};

/// Default number of tenants kept in memory.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// In-process cache service.
pub struct LruTenantCache {
    cache: Mutex<LruCache<String, String>>,
}

impl LruTenantCache {
    /// Create a new cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, String>>, CacheError> {
        self.cache
            .lock()
            .map_err(|_| CacheError::Unreachable("tenant cache lock poisoned".to_string()))
    }
}

impl Default for LruTenantCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl CacheService for LruTenantCache {
    async fn ping(&self) -> Result<(), CacheError> {
        self.lock().map(|_| ())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.lock()?.put(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.lock()?.pop(key).is_some())
    }
}
