//! [`ApiClient`] implementation.

use std::sync::Arc;
use std::time::Duration;

use bistro_core::{
    OrderConfirmation, OrderSubmission, Product, ProductId, ProductInput, category_filter,
};
use moka::future::Cache;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, ErrorBody, OrderService};
use crate::config::ClientConfig;

/// Maximum number of characters of an error body kept in logs and errors.
const ERROR_BODY_LIMIT: usize = 200;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Order & Catalog Service REST API.
///
/// Cheap to clone; clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the service at `base_url`, caching catalog reads
    /// for `cache_ttl`.
    #[must_use]
    pub fn new(mut base_url: Url, cache_ttl: Duration) -> Self {
        // Url::join replaces the last path segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url,
                cache,
            }),
        }
    }

    /// Create a client from the environment configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_url.clone(), config.catalog_cache_ttl)
    }

    /// The service root every request is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Drop every cached catalog response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products, optionally restricted to one category.
    ///
    /// `None`, a blank string and `"All"` all mean the whole menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, ApiError> {
        let category = category_filter(category).map(str::to_string);
        let cache_key = CacheKey::Products {
            category: category.clone(),
        };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.endpoint("api/products")?;
        if let Some(category) = &category {
            url.query_pairs_mut().append_pair("category", category);
        }

        let response = self.inner.client.get(url).send().await?;
        let products: Vec<Product> = read_json(response).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or another
    /// error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("api/products/{id}"))?;
        let response = self.inner.client.get(url).send().await?;
        let product: Product = read_json(response).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the input or the request fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError> {
        let url = self.endpoint("api/products")?;
        let response = self.inner.client.post(url).json(input).send().await?;
        let product = read_json(response).await?;
        self.invalidate_cache();
        Ok(product)
    }

    /// Replace every field of a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or another
    /// error if the service rejects the input.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let url = self.endpoint(&format!("api/products/{id}"))?;
        let response = self.inner.client.put(url).json(input).send().await?;
        let product = read_json(response).await?;
        self.invalidate_cache();
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or another
    /// error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("api/products/{id}"))?;
        let response = self.inner.client.delete(url).send().await?;
        ensure_success(response).await?;
        self.invalidate_cache();
        Ok(())
    }

    /// Upload a product photo and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the file (wrong type, too
    /// large) or the request fails.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<String, ApiError> {
        #[derive(Deserialize)]
        struct Uploaded {
            image_url: String,
        }

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let url = self.endpoint("api/upload")?;
        let response = self.inner.client.post(url).multipart(form).send().await?;
        let uploaded: Uploaded = read_json(response).await?;
        Ok(uploaded.image_url)
    }
}

// =============================================================================
// Orders
// =============================================================================

impl OrderService for ApiClient {
    #[instrument(skip(self, submission), fields(lines = submission.line_items.len()))]
    async fn submit_order(
        &self,
        submission: &OrderSubmission,
    ) -> Result<OrderConfirmation, ApiError> {
        let url = self.endpoint("api/orders")?;
        let response = self.inner.client.post(url).json(submission).send().await?;
        read_json(response).await
    }
}

// =============================================================================
// Response handling
// =============================================================================

async fn ensure_success(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(error_from_response(status, &body))
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let body = ensure_success(response).await?;
    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %truncate(&body),
            "Failed to parse service response"
        );
        ApiError::Parse(e)
    })
}

/// Turn a non-success response into an [`ApiError`], preferring the
/// service's `{"error": ...}` message over the raw body.
fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| truncate(body), |parsed| parsed.error);

    if status == StatusCode::NOT_FOUND {
        ApiError::NotFound(message)
    } else {
        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).unwrap(), Duration::from_secs(60))
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let api = client("http://localhost:5000");
        assert_eq!(
            api.endpoint("api/orders").unwrap().as_str(),
            "http://localhost:5000/api/orders"
        );

        let nested = client("https://example.com/bistro");
        assert_eq!(
            nested.endpoint("api/products/7").unwrap().as_str(),
            "https://example.com/bistro/api/products/7"
        );
    }

    #[test]
    fn test_error_body_message_is_used() {
        let err = error_from_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Order must contain at least one item"}"#,
        );
        assert!(matches!(
            err,
            ApiError::Status { status: 400, ref message } if message == "Order must contain at least one item"
        ));
    }

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err = error_from_response(StatusCode::NOT_FOUND, r#"{"error":"Product not found"}"#);
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Product not found"));
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_non_json_error_body_is_truncated() {
        let body = "x".repeat(1000);
        let err = error_from_response(StatusCode::BAD_GATEWAY, &body);
        let ApiError::Status { status, message } = err else {
            panic!("expected status error");
        };
        assert_eq!(status, 502);
        assert_eq!(message.len(), ERROR_BODY_LIMIT);
    }
}
