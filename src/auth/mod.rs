// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Login, access tokens and per-request tenant routing.
//!
//! ## Auth Flow
//!
//! 1. Client posts `{email, password}` to `/v1/auth/login`
//! 2. Server:
//!    - Looks up the credential by normalised e-mail
//!    - Verifies the password against the stored bcrypt hash
//!    - Resolves the tenant descriptor (cache first, directory on miss)
//!    - Signs an EdDSA access token carrying `sub`, `iat`, `exp`
//! 3. Client sends `Authorization: Bearer <token>` on later requests
//! 4. `require_tenant` verifies the token and attaches the caller's
//!    identity and tenant connection before the handler runs
//!
//! ## Security
//!
//! - Only EdDSA tokens are accepted; the claim set is closed
//! - Token failures are indistinguishable to the caller
//! - Infrastructure failures return a generic 500 body and are logged
//!   server-side with full context

pub mod claims;
pub mod error;
pub mod extractor;
pub mod keys;
pub mod login;
pub mod middleware;
pub mod password;
pub mod token;

pub use claims::{AccessClaims, AuthenticatedUser};
pub use error::AuthError;
pub use extractor::{Auth, Tenant};
pub use keys::SigningKeys;
pub use login::LoginService;
pub use middleware::require_tenant;
pub use token::{TokenIssuer, TokenVerifier};
