//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BISTRO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `BISTRO_HOST` - Bind address (default: 127.0.0.1)
//! - `BISTRO_PORT` - Listen port (default: 5000)
//! - `BISTRO_STORAGE_URL` - Object storage root; image uploads are disabled when unset
//! - `BISTRO_STORAGE_BUCKET` - Bucket for product photos (default: product-images)
//! - `BISTRO_STORAGE_SERVICE_KEY` - Storage service key (required with `BISTRO_STORAGE_URL`)
//! - `BISTRO_DELIVERY_FEE` - Flat fee added to every order (default: 5.00)
//! - `BISTRO_MAX_UPLOAD_BYTES` - Largest accepted image (default: 5 MiB)
//! - `BISTRO_ALLOWED_ORIGINS` - Comma-separated CORS origins (default: any)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use bistro_core::Price;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Order & Catalog Service configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Object storage for product photos, if configured
    pub storage: Option<StorageConfig>,
    /// Flat delivery fee added to every order
    pub delivery_fee: Price,
    /// Largest accepted image upload in bytes
    pub max_upload_bytes: usize,
    /// CORS origins; empty allows any origin
    pub allowed_origins: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Object storage configuration.
///
/// Implements `Debug` manually to redact the service key.
#[derive(Clone)]
pub struct StorageConfig {
    /// Storage service root (e.g., `https://project.supabase.co`)
    pub url: Url,
    /// Bucket product photos are written to
    pub bucket: String,
    /// Service key sent as a bearer token
    pub service_key: SecretString,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("url", &self.url.as_str())
            .field("bucket", &self.bucket)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build configuration from an explicit variable map.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let env = Env(vars);

        let database_url = env.database_url("BISTRO_DATABASE_URL")?;
        let host = env.parse_or::<IpAddr>("BISTRO_HOST", "127.0.0.1")?;
        let port = env.parse_or::<u16>("BISTRO_PORT", "5000")?;
        let storage = StorageConfig::from_env(&env)?;

        let delivery_fee = env.parse_or::<Price>("BISTRO_DELIVERY_FEE", "5.00")?;
        if delivery_fee.is_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "BISTRO_DELIVERY_FEE".to_string(),
                "must not be negative".to_string(),
            ));
        }

        let max_upload_bytes = env.parse_or::<usize>(
            "BISTRO_MAX_UPLOAD_BYTES",
            &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
        )?;

        let allowed_origins = env
            .optional("BISTRO_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            host,
            port,
            storage,
            delivery_fee,
            max_upload_bytes,
            allowed_origins,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StorageConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(raw_url) = env.optional("BISTRO_STORAGE_URL") else {
            return Ok(None);
        };
        let url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BISTRO_STORAGE_URL".to_string(), e.to_string())
        })?;

        Ok(Some(Self {
            url,
            bucket: env
                .optional("BISTRO_STORAGE_BUCKET")
                .unwrap_or_else(|| "product-images".to_string()),
            service_key: env.validated_secret("BISTRO_STORAGE_SERVICE_KEY")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a>(&'a HashMap<String, String>);

impl Env<'_> {
    /// Get a required environment variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional environment variable; blank counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse an environment variable with a default value.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .unwrap_or_else(|| default.to_string())
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }

    /// Load and validate a secret from environment.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated key."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const STRONG_KEY: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config =
            ServerConfig::from_vars(&vars(&[("BISTRO_DATABASE_URL", "postgres://localhost/bistro")]))
                .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.delivery_fee, Price::from_cents(500));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert!(config.storage.is_none());
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn test_database_url_falls_back_to_generic() {
        let config =
            ServerConfig::from_vars(&vars(&[("DATABASE_URL", "postgres://fallback/db")])).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");
    }

    #[test]
    fn test_missing_database_url() {
        let err = ServerConfig::from_vars(&HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "BISTRO_DATABASE_URL"));
    }

    #[test]
    fn test_storage_requires_strong_key() {
        let base = [
            ("BISTRO_DATABASE_URL", "postgres://localhost/bistro"),
            ("BISTRO_STORAGE_URL", "https://storage.local"),
        ];
        let err = ServerConfig::from_vars(&vars(&base)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));

        let mut weak = base.to_vec();
        weak.push(("BISTRO_STORAGE_SERVICE_KEY", "changeme123"));
        let err = ServerConfig::from_vars(&vars(&weak)).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));

        let mut strong = base.to_vec();
        strong.push(("BISTRO_STORAGE_SERVICE_KEY", STRONG_KEY));
        let config = ServerConfig::from_vars(&vars(&strong)).unwrap();
        let storage = config.storage.unwrap();
        assert_eq!(storage.bucket, "product-images");
        assert!(!format!("{storage:?}").contains(STRONG_KEY));
    }

    #[test]
    fn test_allowed_origins_split() {
        let config = ServerConfig::from_vars(&vars(&[
            ("BISTRO_DATABASE_URL", "postgres://localhost/bistro"),
            (
                "BISTRO_ALLOWED_ORIGINS",
                "http://localhost:5173, https://bistro.example.com,",
            ),
        ]))
        .unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:5173", "https://bistro.example.com"]
        );
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_vars(&vars(&[
            ("BISTRO_DATABASE_URL", "postgres://localhost/bistro"),
            ("BISTRO_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "BISTRO_PORT"));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!(shannon_entropy(STRONG_KEY) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(validate_secret_strength("your-api-key-here", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
        assert!(validate_secret_strength(STRONG_KEY, "TEST_VAR").is_ok());
    }
}
