// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant endpoints.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, Tenant};
use crate::models::UserId;

/// Response for GET /v1/tenant/me
#[derive(Debug, Serialize, ToSchema)]
pub struct TenantMeResponse {
    /// Authenticated user's ID
    pub user_id: UserId,
    /// Database this request was routed to
    pub database: String,
    /// When the presented token expires
    pub token_expires_at: DateTime<Utc>,
}

/// Get the caller's identity and routed tenant database.
#[utoipa::path(
    get,
    path = "/v1/tenant/me",
    tag = "Tenant",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's tenant", body = TenantMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "No connection routed for the caller")
    )
)]
pub async fn get_current_tenant(Auth(user): Auth, Tenant(conn): Tenant) -> Json<TenantMeResponse> {
    Json(TenantMeResponse {
        user_id: user.user_id,
        database: conn.database_name().to_string(),
        token_expires_at: user.expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_me_response_serializes() {
        let response = TenantMeResponse {
            user_id: UserId::new("u1"),
            database: "tenant_u1".to_string(),
            token_expires_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["database"], "tenant_u1");
        assert_eq!(json["token_expires_at"], "2023-11-14T22:13:20Z");
    }
}
