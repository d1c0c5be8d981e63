//! Order repository.

use bistro_core::{OrderConfirmation, OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use super::RepositoryError;
use crate::services::pricing::PricedOrder;

#[derive(Debug, sqlx::FromRow)]
struct CreatedOrderRow {
    id: i32,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a priced order and return its confirmation.
    ///
    /// The order is stored with the database default status (`pending`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a table constraint rejects the row.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, order), fields(lines = order.lines.len(), total = %order.total_price))]
    pub async fn create(&self, order: &PricedOrder) -> Result<OrderConfirmation, RepositoryError> {
        let row = sqlx::query_as::<_, CreatedOrderRow>(
            r"
            INSERT INTO ordering.customer_order (
                customer_name, customer_address, customer_phone, payment_method,
                line_items, subtotal, delivery_fee, total_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, status, created_at
            ",
        )
        .bind(&order.delivery.full_name)
        .bind(&order.delivery.address)
        .bind(&order.delivery.phone)
        .bind(order.delivery.payment_method)
        .bind(Json(&order.lines))
        .bind(order.subtotal.amount())
        .bind(order.delivery_fee.amount())
        .bind(order.total_price.amount())
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        Ok(OrderConfirmation {
            confirmation_id: OrderId::new(row.id),
            status: row.status,
            lines: order.lines.clone(),
            subtotal: order.subtotal,
            delivery_fee: order.delivery_fee,
            total_price: order.total_price,
            created_at: row.created_at,
        })
    }
}
