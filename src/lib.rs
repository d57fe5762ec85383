// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant Gateway - Multi-tenant Authentication and Connection Routing
//!
//! Every user owns a dedicated tenant database. This crate logs users in,
//! resolves where their tenant lives, issues signed access tokens and routes
//! each authenticated request to that tenant's connection.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Credentials, access tokens and the routing middleware
//! - `tenancy` - Tenant directory contract, cache-aside resolver, connection router
//! - `storage` - redb directory, in-process cache, per-tenant databases
//! - `bootstrap` - Seed accounts for fresh deployments
//! - `server` - Startup, logging and graceful shutdown

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod state;
pub mod storage;
pub mod tenancy;
