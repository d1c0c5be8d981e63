//! HTTP client for the Order & Catalog Service.
//!
//! # Architecture
//!
//! - The service is the source of truth for the catalog and for order pricing
//! - Catalog reads are cached in-memory via `moka` (5 minute TTL by default)
//! - Catalog writes through this client invalidate the cache
//! - Order submission is exposed through the [`OrderService`] trait so the
//!   checkout orchestrator can run against any backend

mod cache;
mod client;

use std::future::Future;

use bistro_core::{OrderConfirmation, OrderSubmission};
use serde::Deserialize;
use thiserror::Error;

pub use client::ApiClient;

/// Errors that can occur when talking to the service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection refused, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot be joined with an API path.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// The HTTP status the service answered with, if it answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// Error body returned by the service: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Something that accepts orders.
///
/// Implemented by [`ApiClient`]; tests substitute their own.
pub trait OrderService: Send + Sync {
    /// Submit an order and wait for its confirmation.
    fn submit_order(
        &self,
        submission: &OrderSubmission,
    ) -> impl Future<Output = Result<OrderConfirmation, ApiError>> + Send;
}

impl<T: OrderService> OrderService for std::sync::Arc<T> {
    fn submit_order(
        &self,
        submission: &OrderSubmission,
    ) -> impl Future<Output = Result<OrderConfirmation, ApiError>> + Send {
        (**self).submit_order(submission)
    }
}
