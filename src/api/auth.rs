// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{debug, error};

use crate::{
    auth::AuthError,
    models::{LoginRequest, LoginResponse},
    state::AppState,
};

/// Exchange e-mail and password for an access token.
///
/// The token embeds the caller's identity and expires after the configured
/// lifetime (24 hours by default).
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 400, description = "Body is not a valid login request"),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "Account or tenant not found"),
        (status = 500, description = "Infrastructure failure")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let Json(request) = request.map_err(|rejection| {
        debug!(error = %rejection, "Rejected login body");
        AuthError::from(rejection)
    })?;

    state
        .login
        .login(&request.email, &request.password)
        .await
        .map(Json)
        .inspect_err(|e| {
            if e.is_server_error() {
                error!(error = %e, "Login failed");
            }
        })
}
