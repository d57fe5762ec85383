// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Provisioning endpoints.
//!
//! Called by the external provisioning process after it moves a tenant.
//! Guarded by the `X-Provisioning-Key` header; when no key is configured the
//! endpoints answer 404 as if they did not exist.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    models::UserId,
    state::AppState,
    tenancy::TenancyError,
};

/// Header carrying the provisioning secret.
pub const PROVISIONING_KEY_HEADER: &str = "x-provisioning-key";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Result of a tenant refresh.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshTenantResponse {
    /// Refreshed user.
    pub user_id: UserId,
    /// Database the user is now routed to.
    pub database: String,
    /// Whether a cached descriptor was dropped.
    pub cache_invalidated: bool,
    /// Whether a new connection replaced the previous one.
    pub reconnected: bool,
}

// ============================================================================
// Extractor
// ============================================================================

/// Extractor that requires a valid provisioning key.
pub struct Provisioner;

impl FromRequestParts<AppState> for Provisioner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.provisioning_key.as_ref() else {
            return Err(ApiError::not_found("Not found"));
        };

        let presented = parts
            .headers
            .get(PROVISIONING_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if presented.is_empty() || !expected.matches(presented) {
            warn!(path = %parts.uri.path(), "Rejected provisioning request");
            return Err(ApiError::forbidden("Invalid provisioning key"));
        }
        Ok(Provisioner)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Re-read a tenant's descriptor and re-route its connection.
///
/// Drops the cached descriptor, reads the directory, reconnects if the
/// database changed and re-registers the route.
#[utoipa::path(
    post,
    path = "/v1/admin/tenants/{user_id}/refresh",
    tag = "Admin",
    params(("user_id" = String, Path, description = "User whose tenant moved")),
    security(("provisioning_key" = [])),
    responses(
        (status = 200, description = "Tenant refreshed", body = RefreshTenantResponse),
        (status = 400, description = "Blank user ID"),
        (status = 403, description = "Invalid provisioning key"),
        (status = 404, description = "No tenant for this user, or provisioning disabled"),
        (status = 500, description = "Cache, directory or connection failure")
    )
)]
pub async fn refresh_tenant(
    _: Provisioner,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<RefreshTenantResponse>, ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::bad_request("user_id must not be blank"));
    }
    let user_id = UserId::new(user_id);

    let cache_invalidated = state.resolver.invalidate(&user_id).await.map_err(|e| {
        error!(user_id = %user_id, error = %e, "Failed to invalidate cached tenant");
        ApiError::internal()
    })?;

    let descriptor = match state.resolver.lookup_directory(&user_id).await {
        Ok(descriptor) => descriptor,
        Err(TenancyError::TenantNotFound(_)) => {
            return Err(ApiError::not_found("No tenant is provisioned for this user"));
        }
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Directory lookup failed during refresh");
            return Err(ApiError::internal());
        }
    };

    let router = Arc::clone(&state.router);
    let connector = Arc::clone(&state.connector);
    let target = descriptor.clone();
    let (connection, reconnected) =
        tokio::task::spawn_blocking(move || router.refresh(&target, connector.as_ref()))
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "Refresh task aborted");
                ApiError::internal()
            })?
            .map_err(|e| {
                error!(
                    user_id = %user_id,
                    database = %descriptor.database,
                    error = %e,
                    "Failed to reconnect tenant"
                );
                ApiError::internal()
            })?;

    info!(
        user_id = %user_id,
        database = %connection.database_name(),
        cache_invalidated,
        reconnected,
        "Tenant refreshed"
    );

    Ok(Json(RefreshTenantResponse {
        user_id,
        database: connection.database_name().to_string(),
        cache_invalidated,
        reconnected,
    }))
}
