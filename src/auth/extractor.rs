// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the authenticated user and their tenant connection.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth, Tenant(conn): Tenant) -> impl IntoResponse {
//!     // user is AuthenticatedUser, conn is that user's TenantConnection
//! }
//! ```
//!
//! Behind `require_tenant` both read what the middleware attached. Outside
//! it they verify the bearer token themselves.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::middleware::{authenticate, authorize};
use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;
use crate::tenancy::TenantConnection;

/// Extractor for authenticated users.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        authenticate(state, &parts.headers).map(Auth)
    }
}

/// Extractor for the caller's routed tenant connection.
pub struct Tenant(pub TenantConnection);

impl FromRequestParts<AppState> for Tenant {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(connection) = parts.extensions.get::<TenantConnection>().cloned() {
            return Ok(Tenant(connection));
        }

        let (user, connection) = authorize(state, &parts.headers)?;
        parts.extensions.insert(user);
        parts.extensions.insert(connection.clone());
        Ok(Tenant(connection))
    }
}
