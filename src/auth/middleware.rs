// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant routing middleware for Axum.
//!
//! `require_tenant` guards a router subtree: it verifies the bearer token,
//! looks up the caller's connection and attaches both to the request before
//! any handler runs. Requests that fail either step never reach a handler.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/tenant/me", get(tenant::me))
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), require_tenant));
//! ```

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;
use crate::tenancy::TenantConnection;

/// Authentication and routing middleware function.
pub async fn require_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authorize(&state, request.headers()) {
        Ok((user, connection)) => {
            request.extensions_mut().insert(user);
            request.extensions_mut().insert(connection);
            next.run(request).await
        }
        Err(e) => {
            if e.is_server_error() {
                error!(
                    error = %e,
                    path = %request.uri().path(),
                    "Request could not be routed to a tenant"
                );
            } else {
                debug!(error = %e, path = %request.uri().path(), "Request rejected");
            }
            e.into_response()
        }
    }
}

/// Verify the bearer token and route the identity it carries.
pub(crate) fn authorize(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(AuthenticatedUser, TenantConnection), AuthError> {
    let user = authenticate(state, headers)?;
    let connection = state.router.route(&user.user_id)?;
    Ok((user, connection))
}

/// Verify the bearer token only.
pub(crate) fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    state.verifier.verify(token)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}
