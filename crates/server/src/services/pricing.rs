//! Order pricing.
//!
//! The service never trusts client-side amounts. Every line is priced from
//! the catalog row for its product; the client's total is only compared
//! against the result for logging.
//!
//! Pricing is split in two pure steps so the route handler only touches the
//! database once:
//!
//! 1. [`requested_lines`] validates the submission and merges duplicate lines
//! 2. [`price_order`] prices those lines against the fetched catalog rows

use std::collections::HashMap;

use bistro_core::{
    DeliveryDetails, DeliveryField, OrderLine, OrderSubmission, Price, Product, ProductId,
};
use thiserror::Error;

/// Reasons an order cannot be priced. All are the customer's to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Quantity for product {0} must be at least 1")]
    ZeroQuantity(ProductId),

    #[error("Product {0} does not exist")]
    UnknownProduct(ProductId),

    #[error("{name} is currently unavailable")]
    Unavailable { id: ProductId, name: String },

    #[error("Missing delivery details: {}", format_fields(.0))]
    MissingDetails(Vec<DeliveryField>),
}

fn format_fields(fields: &[DeliveryField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A requested product and its merged quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// An order priced from the catalog, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub delivery: DeliveryDetails,
    pub lines: Vec<OrderLine>,
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total_price: Price,
}

/// Validate a submission and merge lines that name the same product.
///
/// Lines keep the order in which each product first appears.
///
/// # Errors
///
/// Returns `PricingError` if the order is empty, a line has quantity zero,
/// or a delivery field is blank.
pub fn requested_lines(submission: &OrderSubmission) -> Result<Vec<RequestedLine>, PricingError> {
    if submission.line_items.is_empty() {
        return Err(PricingError::EmptyOrder);
    }

    let missing = submission.delivery.missing_fields();
    if !missing.is_empty() {
        return Err(PricingError::MissingDetails(missing));
    }

    let mut lines: Vec<RequestedLine> = Vec::with_capacity(submission.line_items.len());
    for item in &submission.line_items {
        if item.quantity == 0 {
            return Err(PricingError::ZeroQuantity(item.product_id));
        }
        match lines.iter_mut().find(|l| l.product_id == item.product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => lines.push(RequestedLine {
                product_id: item.product_id,
                quantity: item.quantity,
            }),
        }
    }

    Ok(lines)
}

/// Price `lines` from `catalog` and add the delivery fee.
///
/// `catalog` may hold extra products; only the requested ones are used.
///
/// # Errors
///
/// Returns `PricingError` if a requested product is missing from the catalog
/// or not available.
pub fn price_order(
    delivery: &DeliveryDetails,
    lines: &[RequestedLine],
    catalog: &[Product],
    delivery_fee: Price,
) -> Result<PricedOrder, PricingError> {
    if lines.is_empty() {
        return Err(PricingError::EmptyOrder);
    }

    let by_id: HashMap<ProductId, &Product> = catalog.iter().map(|p| (p.id, p)).collect();

    let priced = lines
        .iter()
        .map(|line| {
            let product = by_id
                .get(&line.product_id)
                .ok_or(PricingError::UnknownProduct(line.product_id))?;
            if !product.available {
                return Err(PricingError::Unavailable {
                    id: product.id,
                    name: product.name.clone(),
                });
            }
            Ok(OrderLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity: line.quantity,
                line_total: product.price.times(line.quantity),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let subtotal: Price = priced.iter().map(|l| l.line_total).sum();

    Ok(PricedOrder {
        delivery: trimmed(delivery),
        lines: priced,
        subtotal,
        delivery_fee,
        total_price: subtotal + delivery_fee,
    })
}

fn trimmed(details: &DeliveryDetails) -> DeliveryDetails {
    DeliveryDetails {
        full_name: details.full_name.trim().to_string(),
        address: details.address.trim().to_string(),
        phone: details.phone.trim().to_string(),
        payment_method: details.payment_method,
    }
}
