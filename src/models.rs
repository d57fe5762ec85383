// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared request/response types and identifiers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;

/// Opaque, immutable user identifier.
///
/// Every tenant is keyed by the identity of the user who owns it; the same
/// value is embedded as `sub` in access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "usr_3f2c9a")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(format!("usr_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Canonical form of a login e-mail: NFKC, trimmed, lowercase.
///
/// Applied both when credentials are stored and when they are looked up.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().nfkc().collect::<String>().to_lowercase()
}

/// Request body for POST /v1/auth/login
#[derive(Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login e-mail address.
    #[schema(example = "a@x.com")]
    pub email: String,
    /// Plaintext password.
    #[schema(example = "p1")]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Response for a successful login.
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Signed access token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Absolute expiry of the access token.
    pub expires_at: DateTime<Utc>,
    /// Identity embedded in the token.
    pub user_id: UserId,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  A@X.com "), "a@x.com");
    }

    #[test]
    fn normalize_email_applies_nfkc() {
        // Fullwidth Latin letters fold to ASCII under NFKC.
        assert_eq!(normalize_email("ａ@x.com"), "a@x.com");
    }

    #[test]
    fn user_id_serializes_as_plain_string() {
        let id = UserId::new("usr_1");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""usr_1""#);
        let back: UserId = serde_json::from_str(r#""usr_1""#).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let request = LoginRequest {
            email: "a@x.com".to_string(),
            password: "p1-secret".to_string(),
        };
        assert!(!format!("{request:?}").contains("p1-secret"));

        let response = LoginResponse {
            access_token: "eyJhbGciOi.token".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: Utc::now(),
            user_id: UserId::new("u1"),
        };
        assert!(!format!("{response:?}").contains("eyJhbGciOi"));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(UserId::generate(), UserId::generate());
    }
}
