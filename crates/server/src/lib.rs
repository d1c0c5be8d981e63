//! Bistro Order & Catalog Service.
//!
//! A single JSON API that owns the menu and accepts delivery orders.
//!
//! # Architecture
//!
//! - Axum web framework, one router for catalog, orders and uploads
//! - `PostgreSQL` via sqlx for products and orders
//! - Orders are priced server-side from the catalog; client totals are hints
//! - Product photos are pushed to an object storage bucket over HTTP
//!
//! The router is built by [`app`] so tests can drive it without binding a
//! socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers are added by the binary so tests run without a Sentry hub.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().allowed_origins);
    let max_upload_bytes = state.config().max_upload_bytes;

    Router::new()
        .merge(routes::health_routes())
        .nest("/api", routes::api_routes(max_upload_bytes))
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors)
}

/// CORS for the configured origins, or any origin when none are configured.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(middleware::REQUEST_ID_HEADER)])
}
