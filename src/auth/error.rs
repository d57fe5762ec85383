// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::tenancy::TenancyError;

/// Authentication and routing error type.
///
/// `Display` carries full detail for server-side logs. Responses only carry
/// `public_message()`, which never distinguishes why a token was rejected
/// and never exposes infrastructure detail.
#[derive(Debug)]
pub enum AuthError {
    /// Login body is missing, not JSON, or has the wrong shape
    InvalidRequest(String),
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed or carries unexpected claims
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token is signed with an algorithm other than EdDSA
    UnsupportedAlgorithm,
    /// Password does not match the stored hash
    InvalidCredentials,
    /// No credential for the supplied login
    AccountNotFound,
    /// Authenticated identity has no provisioned tenant
    TenantNotFound,
    /// Authenticated identity has no connection in the router
    RouteNotFound(String),
    /// Cache, store or timeout failure
    Infrastructure(String),
    /// Internal error (malformed hash, signing failure)
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::UnsupportedAlgorithm => "invalid_token",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountNotFound => "account_not_found",
            AuthError::TenantNotFound => "tenant_not_found",
            AuthError::RouteNotFound(_)
            | AuthError::Infrastructure(_)
            | AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::UnsupportedAlgorithm
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::AccountNotFound | AuthError::TenantNotFound => StatusCode::NOT_FOUND,
            AuthError::RouteNotFound(_)
            | AuthError::Infrastructure(_)
            | AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidRequest(_) => "Failed to parse the request body as JSON",
            AuthError::MissingAuthHeader => "Authorization header is required",
            AuthError::InvalidAuthHeader => {
                "Invalid authorization header format (expected 'Bearer <token>')"
            }
            AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::UnsupportedAlgorithm => "Invalid or expired token",
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::AccountNotFound => "Account not found",
            AuthError::TenantNotFound => "No tenant is provisioned for this account",
            AuthError::RouteNotFound(_)
            | AuthError::Infrastructure(_)
            | AuthError::InternalError(_) => "Internal server error",
        }
    }

    /// Whether this is a server-side failure.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidRequest(msg) => write!(f, "Invalid request body: {msg}"),
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => write!(f, "Invalid authorization header format"),
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::UnsupportedAlgorithm => write!(f, "Token uses an unsupported algorithm"),
            AuthError::InvalidCredentials => write!(f, "Password does not match"),
            AuthError::AccountNotFound => write!(f, "No credential for login"),
            AuthError::TenantNotFound => write!(f, "No tenant provisioned"),
            AuthError::RouteNotFound(user_id) => {
                write!(f, "No connection routed for user {user_id}")
            }
            AuthError::Infrastructure(msg) => write!(f, "Infrastructure failure: {msg}"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<TenancyError> for AuthError {
    fn from(e: TenancyError) -> Self {
        match e {
            TenancyError::TenantNotFound(_) => AuthError::TenantNotFound,
            TenancyError::RouteNotFound(user_id) => AuthError::RouteNotFound(user_id.to_string()),
            other @ (TenancyError::Cache(_)
            | TenancyError::Directory(_)
            | TenancyError::Timeout { .. }
            | TenancyError::Connect(_)) => AuthError::Infrastructure(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.public_message().to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
