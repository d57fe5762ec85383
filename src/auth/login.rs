// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login flow: credential check, tenant resolution, token issuance.
//!
//! Every step must succeed before a token is produced; a failing cache or
//! directory aborts the login with no partial result.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::password::verify_password;
use super::token::TokenIssuer;
use super::AuthError;
use crate::models::{normalize_email, LoginResponse};
use crate::tenancy::directory::query;
use crate::tenancy::{TenantDirectory, TenantResolver};

/// Orchestrates a login.
pub struct LoginService {
    directory: Arc<dyn TenantDirectory>,
    resolver: Arc<TenantResolver>,
    issuer: TokenIssuer,
    timeout: Duration,
}

impl LoginService {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        resolver: Arc<TenantResolver>,
        issuer: TokenIssuer,
        timeout: Duration,
    ) -> Self {
        Self {
            directory,
            resolver,
            issuer,
            timeout,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(email);

        let lookup_email = email.clone();
        let credential = query(&self.directory, "credential lookup", self.timeout, move |d| {
            d.get_credential(&lookup_email)
        })
        .await?
        .ok_or_else(|| {
            debug!("Login for unknown account");
            AuthError::AccountNotFound
        })?;

        let user_id = credential.user_id.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || verify_password(&password, &credential.password_hash))
            .await
            .map_err(|e| AuthError::InternalError(format!("password check aborted: {e}")))?
            .inspect_err(|e| {
                if let AuthError::InternalError(_) = e {
                    warn!(user_id = %user_id, error = %e, "Stored credential is unusable");
                }
            })?;

        let descriptor = self.resolver.resolve(&user_id).await?;
        debug!(user_id = %user_id, database = %descriptor.database, "Tenant resolved");

        let issued = self.issuer.issue(&user_id)?;
        info!(user_id = %user_id, expires_at = %issued.expires_at, "Access token issued");

        Ok(LoginResponse {
            access_token: issued.token,
            token_type: "Bearer".to_string(),
            expires_at: issued.expires_at,
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::keys::SigningKeys;
    use crate::auth::password::hash_password;
    use crate::auth::token::TokenVerifier;
    use crate::models::UserId;
    use crate::tenancy::cache::testing::FlakyCache;
    use crate::tenancy::directory::testing::MemoryDirectory;
    use crate::tenancy::{CacheService, CredentialRecord, TenantDescriptor};

    fn descriptor(user: &str) -> TenantDescriptor {
        TenantDescriptor {
            user_id: UserId::new(user),
            host: "db.internal".to_string(),
            port: 5432,
            database: format!("tenant_{user}"),
            username: user.to_string(),
            password: "secret".to_string(),
        }
    }

    fn directory() -> MemoryDirectory {
        MemoryDirectory::default()
            .with_credential(CredentialRecord {
                user_id: UserId::new("u1"),
                email: "a@x.com".to_string(),
                password_hash: hash_password("p1", 4).unwrap(),
            })
            .with_tenant(descriptor("u1"))
    }

    fn service(cache: Arc<dyn CacheService>, directory: MemoryDirectory) -> (LoginService, TokenVerifier) {
        let directory: Arc<dyn TenantDirectory> = Arc::new(directory);
        let keys = SigningKeys::generate().unwrap();
        let resolver = Arc::new(TenantResolver::new(cache, Arc::clone(&directory)));
        let service = LoginService::new(
            directory,
            resolver,
            TokenIssuer::new(&keys),
            Duration::from_secs(2),
        );
        (service, TokenVerifier::new(&keys))
    }

    #[tokio::test]
    async fn login_issues_token_for_matching_password() {
        let (service, verifier) = service(Arc::new(FlakyCache::default()), directory());

        let response = service.login("a@x.com", "p1").await.unwrap();
        assert!(!response.access_token.is_empty());
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.user_id.as_str(), "u1");

        let user = verifier.verify(&response.access_token).unwrap();
        assert_eq!(user.user_id.as_str(), "u1");
    }

    #[tokio::test]
    async fn login_normalises_email() {
        let (service, _) = service(Arc::new(FlakyCache::default()), directory());
        assert!(service.login("  A@X.com ", "p1").await.is_ok());
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let (service, _) = service(Arc::new(FlakyCache::default()), directory());
        let err = service.login("a@x.com", "p2").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_account() {
        let (service, _) = service(Arc::new(FlakyCache::default()), directory());
        let err = service.login("b@x.com", "p1").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountNotFound));
    }

    #[tokio::test]
    async fn unreachable_cache_blocks_login() {
        let (service, _) = service(Arc::new(FlakyCache::unreachable()), directory());
        let err = service.login("a@x.com", "p1").await.unwrap_err();
        assert!(matches!(err, AuthError::Infrastructure(_)));
    }

    #[tokio::test]
    async fn credential_without_tenant_is_tenant_not_found() {
        let directory = MemoryDirectory::default().with_credential(CredentialRecord {
            user_id: UserId::new("u2"),
            email: "c@x.com".to_string(),
            password_hash: hash_password("p1", 4).unwrap(),
        });
        let (service, _) = service(Arc::new(FlakyCache::default()), directory);

        let err = service.login("c@x.com", "p1").await.unwrap_err();
        assert!(matches!(err, AuthError::TenantNotFound));
    }

    #[tokio::test]
    async fn malformed_stored_hash_is_internal() {
        let directory = MemoryDirectory::default()
            .with_credential(CredentialRecord {
                user_id: UserId::new("u1"),
                email: "a@x.com".to_string(),
                password_hash: "plaintext".to_string(),
            })
            .with_tenant(descriptor("u1"));
        let (service, _) = service(Arc::new(FlakyCache::default()), directory);

        let err = service.login("a@x.com", "p1").await.unwrap_err();
        assert!(matches!(err, AuthError::InternalError(_)));
    }
}
