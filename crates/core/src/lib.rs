//! Bistro Core - Shared domain library.
//!
//! This crate provides the types and pure domain logic used across all Bistro
//! components:
//! - `client` - Cart store, checkout orchestrator and API client
//! - `server` - Order & Catalog Service (REST)
//! - `cli` - Command-line shell, migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and statuses
//! - [`product`] - Catalog products and product input validation
//! - [`cart`] - The cart state machine (line items, merge-on-add, totals)
//! - [`order`] - Delivery details, order submissions and confirmations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod product;
pub mod types;

pub use cart::{CartState, LineItem, QuantityChange};
pub use order::{DeliveryDetails, DeliveryField, OrderConfirmation, OrderLine, OrderSubmission};
pub use product::{
    ALL_CATEGORIES, Product, ProductInput, ProductInputError, categories, category_filter,
};
pub use types::*;
