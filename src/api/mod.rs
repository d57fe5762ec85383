// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_tenant,
    models::{LoginRequest, LoginResponse, UserId},
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod tenant;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub fn router(state: AppState) -> Router {
    // Every route here runs behind require_tenant.
    let tenant_routes = Router::new()
        .route("/tenant/me", get(tenant::get_current_tenant))
        .route_layer(from_fn_with_state(state.clone(), require_tenant));

    let v1_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route(
            "/admin/tenants/{user_id}/refresh",
            post(admin::refresh_tenant),
        )
        .merge(tenant_routes)
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        tenant::get_current_tenant,
        admin::refresh_tenant,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            UserId,
            LoginRequest,
            LoginResponse,
            tenant::TenantMeResponse,
            admin::RefreshTenantResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and access tokens"),
        (name = "Tenant", description = "Routed tenant information"),
        (name = "Admin", description = "Provisioning hooks"),
        (name = "Health", description = "Liveness and readiness")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "provisioning_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                admin::PROVISIONING_KEY_HEADER,
            ))),
        );
    }
}
