// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token issuance and verification.
//!
//! Tokens are compact JWS signed with Ed25519 (`alg: EdDSA`) and carry
//! exactly `sub`, `iat` and `exp`. Verification checks, in order:
//!
//! 1. the header names EdDSA (anything else is `UnsupportedAlgorithm`)
//! 2. the signature against the service key
//! 3. the claim set is complete and closed
//! 4. `now < exp + leeway`
//!
//! The expiry check runs against an explicit `now` so callers and tests
//! control the clock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{AccessClaims, AuthenticatedUser};
use super::keys::SigningKeys;
use super::AuthError;
use crate::models::UserId;

/// Default token lifetime (24 hours).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A freshly signed token and its expiry.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Signs access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(keys: &SigningKeys) -> Self {
        Self {
            key: keys.encoding_key().clone(),
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id` valid from now.
    pub fn issue(&self, user_id: &UserId) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let iat = now.timestamp();
        let ttl = i64::try_from(self.ttl.as_secs())
            .map_err(|_| AuthError::InternalError("token ttl out of range".to_string()))?;
        let exp = iat
            .checked_add(ttl)
            .ok_or_else(|| AuthError::InternalError("token expiry overflow".to_string()))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::InternalError("token expiry out of range".to_string()))?;

        let claims = AccessClaims {
            sub: user_id.to_string(),
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.key)
            .map_err(|e| AuthError::InternalError(format!("token signing failed: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}

/// Verifies access tokens issued by [`TokenIssuer`].
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    leeway: Duration,
}

impl TokenVerifier {
    pub fn new(keys: &SigningKeys) -> Self {
        Self {
            key: keys.decoding_key().clone(),
            leeway: Duration::ZERO,
        }
    }

    /// Clock skew tolerated past `exp`.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify `token` as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AuthenticatedUser, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        if header.alg != Algorithm::EdDSA {
            return Err(AuthError::UnsupportedAlgorithm);
        }

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        let claims = decode::<AccessClaims>(token, &self.key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => AuthError::UnsupportedAlgorithm,
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::MalformedToken,
            })?
            .claims;

        let leeway = i64::try_from(self.leeway.as_secs()).unwrap_or(i64::MAX);
        if now.timestamp() >= claims.exp.saturating_add(leeway) {
            return Err(AuthError::TokenExpired);
        }

        AuthenticatedUser::try_from(claims)
    }
}
