//! Order route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use bistro_core::{OrderConfirmation, OrderSubmission, ProductId};
use tracing::{info, instrument, warn};

use crate::db::{OrderRepository, ProductRepository};
use crate::error::Result;
use crate::services::pricing;
use crate::state::AppState;

/// Accept an order.
///
/// Lines are priced from the catalog; the client's `total_price` is only
/// compared against the computed subtotal.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<OrderSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderConfirmation>)> {
    let Json(submission) = payload?;

    let lines = pricing::requested_lines(&submission)?;
    let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
    let catalog = ProductRepository::new(state.pool()).get_many(&ids).await?;

    let order = pricing::price_order(
        &submission.delivery,
        &lines,
        &catalog,
        state.config().delivery_fee,
    )?;

    if let Some(client_total) = submission.total_price
        && client_total != order.subtotal
    {
        warn!(
            client_total = %client_total,
            subtotal = %order.subtotal,
            "Client total differs from catalog pricing; using catalog prices"
        );
    }

    let confirmation = OrderRepository::new(state.pool()).create(&order).await?;
    info!(
        confirmation_id = %confirmation.confirmation_id,
        total = %confirmation.total_price,
        payment_method = %order.delivery.payment_method,
        "Order accepted"
    );

    Ok((StatusCode::CREATED, Json(confirmation)))
}
