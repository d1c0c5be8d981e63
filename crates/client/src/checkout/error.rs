//! Checkout error types.

use std::time::Duration;

use bistro_core::DeliveryField;
use thiserror::Error;

use crate::api::ApiError;

/// Input problems caught before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Checkout needs at least one line item.
    #[error("cart is empty")]
    EmptyCart,

    /// Required delivery fields are blank.
    #[error("missing delivery details: {}", format_fields(.0))]
    MissingFields(Vec<DeliveryField>),
}

fn format_fields(fields: &[DeliveryField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The order submission call failed. Always retryable: the cart and the
/// entered delivery details are kept.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The order service returned an error or could not be reached.
    #[error(transparent)]
    Service(#[from] ApiError),

    /// The order service did not answer in time.
    #[error("order service did not answer within {0:?}")]
    Timeout(Duration),
}

/// Errors returned by [`Checkout`](super::Checkout) operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("order submission failed: {0}")]
    Submission(#[from] SubmissionError),

    /// The operation is not allowed in the current phase.
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

impl CheckoutError {
    /// Whether the customer can simply try again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Submission(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message_lists_fields() {
        let err = ValidationError::MissingFields(vec![DeliveryField::FullName, DeliveryField::Phone]);
        assert_eq!(err.to_string(), "missing delivery details: full name, phone");
    }

    #[test]
    fn test_only_submission_errors_are_retryable() {
        let timeout = CheckoutError::from(SubmissionError::Timeout(Duration::from_secs(15)));
        assert!(timeout.is_retryable());
        assert!(!CheckoutError::from(ValidationError::EmptyCart).is_retryable());
    }
}
