// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token claims and authenticated user representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AuthError;
use crate::models::UserId;

/// Claims carried by an access token.
///
/// The set is closed: tokens with any other claim are rejected as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// Authenticated user information extracted from a verified token.
///
/// This is the primary type used throughout the application to represent
/// the authenticated user making a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: UserId,

    /// When the token was issued
    pub issued_at: DateTime<Utc>,

    /// When the token expires
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<AccessClaims> for AuthenticatedUser {
    type Error = AuthError;

    fn try_from(claims: AccessClaims) -> Result<Self, Self::Error> {
        if claims.sub.is_empty() {
            return Err(AuthError::MalformedToken);
        }
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::MalformedToken)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::MalformedToken)?;

        Ok(Self {
            user_id: UserId::new(claims.sub),
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> AccessClaims {
        AccessClaims {
            sub: "usr_123".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_086_400,
        }
    }

    #[test]
    fn user_from_claims() {
        let user = AuthenticatedUser::try_from(sample_claims()).unwrap();
        assert_eq!(user.user_id.as_str(), "usr_123");
        assert_eq!(user.issued_at.timestamp(), 1_700_000_000);
        assert_eq!(user.expires_at.timestamp(), 1_700_086_400);
    }

    #[test]
    fn empty_subject_is_malformed() {
        let mut claims = sample_claims();
        claims.sub.clear();
        assert!(matches!(
            AuthenticatedUser::try_from(claims),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn unknown_claims_are_rejected() {
        let raw = r#"{"sub":"u1","iat":1,"exp":2,"role":"admin"}"#;
        assert!(serde_json::from_str::<AccessClaims>(raw).is_err());
    }

    #[test]
    fn missing_claims_are_rejected() {
        let raw = r#"{"sub":"u1","iat":1}"#;
        assert!(serde_json::from_str::<AccessClaims>(raw).is_err());
    }
}
