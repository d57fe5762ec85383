// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing and verification (bcrypt, salted per credential).

use super::AuthError;

/// Default bcrypt cost for newly stored credentials.
pub const DEFAULT_HASH_COST: u32 = bcrypt::DEFAULT_COST;

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost)
        .map_err(|e| AuthError::InternalError(format!("password hashing failed: {e}")))
}

/// Check `password` against a stored bcrypt hash.
///
/// `InvalidCredentials` on mismatch, `InternalError` when the stored hash
/// cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    match bcrypt::verify(password, stored_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::InvalidCredentials),
        Err(e) => Err(AuthError::InternalError(format!(
            "stored password hash is unusable: {e}"
        ))),
    }
}
