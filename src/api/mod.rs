// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
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
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{challenge_middleware, hmac_auth_middleware},
    models::Item,
    state::AppState,
};

pub mod health;
pub mod items;

use health::HealthResponse;

pub fn router(state: AppState) -> Router {
    // Only these routes are authenticated; health and docs stay open.
    let api_routes = Router::new()
        .route("/api/item/get", get(items::get_item))
        .route("/api/item/post", post(items::post_item))
        .route_layer(from_fn_with_state(state.clone(), hmac_auth_middleware));

    Router::new()
        .merge(api_routes)
        .route("/health/live", get(health::liveness))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(from_fn_with_state(state, challenge_middleware))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(items::get_item, items::post_item, health::liveness),
    components(schemas(Item, HealthResponse)),
    modifiers(&HmacSecurity),
    tags(
        (name = "Items", description = "Signed item endpoints"),
        (name = "Health", description = "Liveness probe")
    )
)]
struct ApiDoc;

struct HmacSecurity;

impl Modify for HmacSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "hmac",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`<scheme> <appId>:<signature>:<nonce>:<timestamp>`",
            ))),
        );
    }
}
