//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness
//! GET    /health/ready            - Readiness (database ping)
//!
//! # Catalog
//! GET    /api/products?category=  - List products ("All" or absent = no filter)
//! GET    /api/products/{id}       - One product
//! POST   /api/products            - Create product (201)
//! PUT    /api/products/{id}       - Replace product
//! DELETE /api/products/{id}       - Delete product (204)
//!
//! # Orders
//! POST   /api/orders              - Submit order (201 + confirmation)
//!
//! # Uploads
//! POST   /api/upload              - Multipart field "image" -> {"image_url": ...}
//! ```

pub mod health;
pub mod orders;
pub mod products;
pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create the JSON API router.
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/orders", post(orders::create))
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
}
