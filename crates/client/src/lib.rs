//! Bistro client library.
//!
//! Everything a customer-facing shell needs to take an order:
//!
//! - [`cart`] - the persisted cart store (an explicit, cloneable handle)
//! - [`checkout`] - the checkout orchestrator state machine
//! - [`api`] - the HTTP client for the Order & Catalog Service
//! - [`config`] - environment configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use bistro_client::{ApiClient, CartStore, Checkout, ClientConfig, FileCartStorage};
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::from_config(&config);
//! let cart = CartStore::open(FileCartStorage::new(&config.cart_path));
//!
//! let burger = api.get_product(ProductId::new(1)).await?;
//! cart.add_item(&burger);
//!
//! let checkout = Checkout::new(cart.clone(), api, config.checkout_settings());
//! checkout.begin()?;
//! checkout.set_delivery_details(details)?;
//! checkout.submit().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;

pub use api::{ApiClient, ApiError, OrderService};
pub use cart::{CartEvent, CartStorage, CartStore, FileCartStorage, MemoryCartStorage, PersistenceError};
pub use checkout::{
    Checkout, CheckoutError, CheckoutPhase, CheckoutSettings, CheckoutSummary, SubmissionError,
    SubmitOutcome, ValidationError,
};
pub use config::{ClientConfig, ConfigError};
