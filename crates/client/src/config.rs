//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `BISTRO_API_URL` - Order & Catalog Service root (default: `http://localhost:5000`)
//! - `BISTRO_CART_PATH` - Persisted cart file (default: `.bistro/cart.json`)
//! - `BISTRO_SUBMIT_TIMEOUT_SECS` - Order submission timeout (default: 15)
//! - `BISTRO_CONFIRMATION_DISPLAY_SECS` - Confirmation display time (default: 3)
//! - `BISTRO_DELIVERY_FEE` - Delivery fee shown at review (default: 5.00)
//! - `BISTRO_CATALOG_CACHE_SECS` - Catalog cache TTL (default: 300)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bistro_core::Price;
use thiserror::Error;
use url::Url;

use crate::checkout::CheckoutSettings;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_CART_PATH: &str = ".bistro/cart.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root URL of the Order & Catalog Service
    pub api_url: Url,
    /// File the current cart is persisted to
    pub cart_path: PathBuf,
    /// Bound on a single order submission
    pub submit_timeout: Duration,
    /// How long a confirmation stays up
    pub confirmation_display: Duration,
    /// Delivery fee shown on the review screen
    pub delivery_fee: Price,
    /// Catalog cache time-to-live
    pub catalog_cache_ttl: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_or(&lookup, "BISTRO_API_URL", DEFAULT_API_URL)?;
        let cart_path = PathBuf::from(
            lookup("BISTRO_CART_PATH").unwrap_or_else(|| DEFAULT_CART_PATH.to_string()),
        );
        let submit_timeout = secs_or(&lookup, "BISTRO_SUBMIT_TIMEOUT_SECS", 15)?;
        let confirmation_display = secs_or(&lookup, "BISTRO_CONFIRMATION_DISPLAY_SECS", 3)?;
        let delivery_fee: Price = parse_or(&lookup, "BISTRO_DELIVERY_FEE", "5.00")?;
        if delivery_fee.is_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "BISTRO_DELIVERY_FEE".to_string(),
                "must not be negative".to_string(),
            ));
        }
        let catalog_cache_ttl = secs_or(&lookup, "BISTRO_CATALOG_CACHE_SECS", 300)?;

        Ok(Self {
            api_url,
            cart_path,
            submit_timeout,
            confirmation_display,
            delivery_fee,
            catalog_cache_ttl,
        })
    }

    /// Checkout tunables derived from this configuration.
    #[must_use]
    pub const fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            submit_timeout: self.submit_timeout,
            confirmation_display: self.confirmation_display,
            delivery_fee: self.delivery_fee,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable, falling back to `default` when unset or blank.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a whole number of seconds.
fn secs_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    parse_or::<u64>(lookup, key, &default.to_string()).map(Duration::from_secs)
}
