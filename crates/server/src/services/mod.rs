//! Business logic that sits between the routes and the database.
//!
//! - [`pricing`] - Server-side order pricing
//! - [`storage`] - Object storage for product photos

pub mod pricing;
pub mod storage;
