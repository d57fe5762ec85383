// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cache service contract used for cache-aside tenant resolution.
//!
//! Values are opaque strings and carry no TTL; an entry lives until it is
//! explicitly deleted (or evicted by the backend for capacity).

use async_trait::async_trait;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("cache unreachable: {0}")]
    Unreachable(String),

    #[error("cache operation failed: {0}")]
    Operation(String),
}

#[async_trait]
pub trait CacheService: Send + Sync {
    /// Liveness probe.
    async fn ping(&self) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Remove `key`; returns whether an entry was present.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// HashMap-backed cache whose reachability can be toggled.
    #[derive(Default)]
    pub struct FlakyCache {
        pub entries: Mutex<HashMap<String, String>>,
        pub down: AtomicBool,
    }

    impl FlakyCache {
        pub fn unreachable() -> Self {
            let cache = Self::default();
            cache.down.store(true, Ordering::SeqCst);
            cache
        }

        fn check(&self) -> Result<(), CacheError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(CacheError::Unreachable("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheService for FlakyCache {
        async fn ping(&self) -> Result<(), CacheError> {
            self.check()
        }

        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.check()?;
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
            self.check()?;
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, CacheError> {
            self.check()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }
    }
}
