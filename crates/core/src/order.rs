//! Delivery details, order submissions and confirmations.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{CartState, LineItem};
use crate::types::{OrderId, OrderStatus, PaymentMethod, Price, ProductId};

/// A required field of [`DeliveryDetails`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryField {
    FullName,
    Address,
    Phone,
}

impl fmt::Display for DeliveryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FullName => "full name",
            Self::Address => "address",
            Self::Phone => "phone",
        })
    }
}

/// Recipient and payment information collected at checkout.
///
/// Phone and address are free text; only presence is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl DeliveryDetails {
    /// Required fields that are empty or whitespace only, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<DeliveryField> {
        [
            (DeliveryField::FullName, &self.full_name),
            (DeliveryField::Address, &self.address),
            (DeliveryField::Phone, &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Whether every required field is filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// The payload sent to the order service.
///
/// `total_price` is the client's computed subtotal and is only a hint; the
/// service prices the order from its own catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub total_price: Option<Price>,
    pub delivery: DeliveryDetails,
}

impl OrderSubmission {
    /// Snapshot a cart and delivery details into a submission.
    #[must_use]
    pub fn from_cart(cart: &CartState, delivery: DeliveryDetails) -> Self {
        Self {
            line_items: cart.items().to_vec(),
            total_price: Some(cart.total()),
            delivery,
        }
    }
}

/// A priced order line as recorded by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Price,
}

/// Acknowledgment of an accepted order.
///
/// All amounts are computed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub confirmation_id: OrderId,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total_price: Price,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::product::Product;

    fn details() -> DeliveryDetails {
        DeliveryDetails {
            full_name: "Ada Lovelace".to_string(),
            address: "12 Analytical Row".to_string(),
            phone: "+44 20 7946 0000".to_string(),
            payment_method: PaymentMethod::Cash,
        }
    }

    #[test]
    fn test_complete_details_have_no_missing_fields() {
        assert!(details().is_complete());
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let mut d = details();
        d.address = "   ".to_string();
        d.phone = String::new();
        assert_eq!(
            d.missing_fields(),
            vec![DeliveryField::Address, DeliveryField::Phone]
        );
    }

    #[test]
    fn test_default_details_miss_everything_and_pay_by_card() {
        let d = DeliveryDetails::default();
        assert_eq!(d.missing_fields().len(), 3);
        assert_eq!(d.payment_method, PaymentMethod::Card);
    }

    #[test]
    fn test_submission_snapshots_cart_total() {
        let mut cart = CartState::new();
        cart.add(&Product {
            id: ProductId::new(1),
            name: "Saffron Paella".to_string(),
            description: String::new(),
            price: Price::from_cents(3200),
            image_url: None,
            category: "Mains".to_string(),
            available: true,
        });

        let submission = OrderSubmission::from_cart(&cart, details());
        assert_eq!(submission.line_items.len(), 1);
        assert_eq!(submission.total_price, Some(Price::from_cents(3200)));

        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["delivery"]["payment_method"], "cash");
        assert_eq!(json["line_items"][0]["product_id"], 1);
    }
}
