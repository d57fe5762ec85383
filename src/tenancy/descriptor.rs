// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Records held by the tenant directory.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::UserId;

/// Connection parameters of a tenant's dedicated database.
///
/// Written by the provisioning process; read-only for this service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantDescriptor {
    /// Owner of the tenant.
    pub user_id: UserId,
    pub host: String,
    pub port: u16,
    /// Database (schema) name, unique per tenant.
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for TenantDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantDescriptor")
            .field("user_id", &self.user_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Stored login credential: one per identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub user_id: UserId,
    /// Normalised login e-mail.
    pub email: String,
    /// Salted bcrypt hash.
    pub password_hash: String,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}
