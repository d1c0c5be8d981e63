//! Payment and order status enums.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the customer pays for a delivery order.
///
/// Payment is never processed by Bistro; the method is recorded on the order
/// so the kitchen and the driver know whether to collect cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "ordering.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment (mocked).
    #[default]
    #[serde(alias = "Card")]
    Card,
    /// Cash on delivery.
    #[serde(alias = "Cash")]
    Cash,
}

impl PaymentMethod {
    /// Returns the wire name of the payment method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cash => "cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            other => Err(format!("invalid payment method: {other}")),
        }
    }
}

/// Order status as assigned by the Order & Catalog Service.
///
/// Every order is created `pending`; later kitchen and delivery states are
/// owned by downstream systems and never reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "ordering.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
        }
    }
}
