// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::auth::keys::SigningKeys;
use crate::auth::login::LoginService;
use crate::auth::token::{TokenIssuer, TokenVerifier};
use crate::config::AuthSettings;
use crate::tenancy::{
    CacheService, ConnectionRouter, TenantConnector, TenantDirectory, TenantResolver,
};

/// SHA-256 digest of the provisioning secret.
#[derive(Clone)]
pub struct ProvisioningKey {
    digest: [u8; 32],
}

impl ProvisioningKey {
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    /// Compare a presented key by digest.
    pub fn matches(&self, presented: &str) -> bool {
        let presented: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        // Branch-free over all 32 bytes; no early exit on the first mismatch.
        presented
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub login: Arc<LoginService>,
    pub verifier: Arc<TokenVerifier>,
    pub resolver: Arc<TenantResolver>,
    pub directory: Arc<dyn TenantDirectory>,
    pub router: Arc<ConnectionRouter>,
    pub connector: Arc<dyn TenantConnector>,
    pub provisioning_key: Option<ProvisioningKey>,
    pub backend_timeout: Duration,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        cache: Arc<dyn CacheService>,
        connector: Arc<dyn TenantConnector>,
        router: ConnectionRouter,
        keys: &SigningKeys,
        settings: &AuthSettings,
    ) -> Self {
        let resolver = Arc::new(
            TenantResolver::new(cache, Arc::clone(&directory))
                .with_timeout(settings.backend_timeout),
        );
        let issuer = TokenIssuer::new(keys).with_ttl(settings.token_ttl);
        let login = LoginService::new(
            Arc::clone(&directory),
            Arc::clone(&resolver),
            issuer,
            settings.backend_timeout,
        );

        Self {
            login: Arc::new(login),
            verifier: Arc::new(TokenVerifier::new(keys).with_leeway(settings.token_leeway)),
            resolver,
            directory,
            router: Arc::new(router),
            connector,
            provisioning_key: None,
            backend_timeout: settings.backend_timeout,
        }
    }

    /// Enable the admin refresh endpoint.
    pub fn with_provisioning_key(mut self, secret: &str) -> Self {
        self.provisioning_key = Some(ProvisioningKey::new(secret));
        self
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::models::UserId;
    use crate::tenancy::cache::testing::FlakyCache;
    use crate::tenancy::directory::testing::MemoryDirectory;
    use crate::tenancy::router::testing::TempConnector;
    use crate::tenancy::{CredentialRecord, TenantDescriptor};

    pub const PROVISIONING_SECRET: &str = "provision-me";

    /// State wired to in-memory backends, with handles kept for assertions.
    pub struct Harness {
        pub state: AppState,
        pub issuer: TokenIssuer,
        pub cache: Arc<FlakyCache>,
        pub directory: Arc<MemoryDirectory>,
        pub connector: Arc<TempConnector>,
    }

    pub fn descriptor(user: &str) -> TenantDescriptor {
        TenantDescriptor {
            user_id: UserId::new(user),
            host: "db.internal".to_string(),
            port: 5432,
            database: format!("tenant_{user}"),
            username: user.to_string(),
            password: "secret".to_string(),
        }
    }

    /// `u1` (a@x.com / p1) and `u2` (b@x.com / p2), both routed.
    /// `u3` (c@x.com / p3) has a tenant in the directory but no route.
    pub fn harness() -> Harness {
        let mut directory = MemoryDirectory::default();
        let accounts = [("u1", "a@x.com", "p1"), ("u2", "b@x.com", "p2"), ("u3", "c@x.com", "p3")];
        for (user, email, password) in accounts {
            directory = directory
                .with_credential(CredentialRecord {
                    user_id: UserId::new(user),
                    email: email.to_string(),
                    password_hash: hash_password(password, 4).unwrap(),
                })
                .with_tenant(descriptor(user));
        }
        let directory = Arc::new(directory);
        let cache = Arc::new(FlakyCache::default());
        let connector = Arc::new(TempConnector::new());

        let router = ConnectionRouter::build(
            [descriptor("u1"), descriptor("u2")],
            connector.as_ref(),
        );

        let keys = SigningKeys::generate().unwrap();
        let state = AppState::new(
            directory.clone(),
            cache.clone(),
            connector.clone(),
            router,
            &keys,
            &AuthSettings::default(),
        )
        .with_provisioning_key(PROVISIONING_SECRET);

        Harness {
            state,
            issuer: TokenIssuer::new(&keys),
            cache,
            directory,
            connector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioning_key_matches_only_its_secret() {
        let key = ProvisioningKey::new("s3cret");
        assert!(key.matches("s3cret"));
        assert!(!key.matches("s3cret "));
        assert!(!key.matches(""));
    }
}
