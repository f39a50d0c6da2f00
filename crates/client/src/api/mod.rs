//! Bazaar marketplace REST API client.
//!
//! # Architecture
//!
//! - Uses `reqwest` for HTTP with JSON request/response bodies
//! - The server is source of truth - no local sync, direct API calls
//! - In-memory caching via `moka` for catalog reads (5 minute TTL)
//! - Cart and order endpoints are never cached (mutable state)
//!
//! Authenticated endpoints take the caller's [`AccessToken`] explicitly; the
//! client itself is stateless apart from the catalog cache, so a single
//! instance can serve any number of sessions.
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_client::{ApiClient, ClientConfig};
//!
//! let client = ApiClient::new(&config);
//!
//! // Public catalog access
//! let products = client.list_products(Page::default()).await?;
//!
//! // Authenticated cart access
//! let items = client.fetch_cart(&token).await?;
//! ```

mod cache;
pub mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use bazaar_core::{AccessToken, CategoryId, Email, OrderId, ProductId, Role, ShopId};

use crate::config::ClientConfig;
use cache::CacheValue;

/// Catalog cache time-to-live.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Catalog cache capacity (entries).
const CACHE_CAPACITY: u64 = 1000;

/// Errors that can occur when calling the marketplace API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, DNS, protocol).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("json parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The server rejected the credential (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Error body shape produced by the marketplace API.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    error: String,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Bazaar marketplace REST API.
///
/// Provides typed access to users, cart, catalog, and order endpoints.
/// Catalog reads are cached for 5 minutes.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request and parse the JSON response body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let text = self.send_raw(request).await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request where the response body is an acknowledgement we discard.
    async fn send_ack(&self, request: reqwest::RequestBuilder) -> Result<(), ApiError> {
        self.send_raw(request).await.map(|_| ())
    }

    /// Send a request, map non-success statuses to errors, return the body text.
    async fn send_raw(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        let message = error_message(&text);
        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    // =========================================================================
    // User Methods
    // =========================================================================

    /// Resolve the identity behind a credential.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is no longer valid,
    /// or another variant if the request fails.
    #[instrument(skip(self, token))]
    pub async fn current_user(&self, token: &AccessToken) -> Result<Identity, ApiError> {
        self.send(
            self.inner
                .client
                .get(self.url("/users/me"))
                .bearer_auth(token.expose()),
        )
        .await
    }

    /// Authenticate with username and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials, or another
    /// variant if the request fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.send(
            self.inner
                .client
                .post(self.url("/users/login"))
                .json(&LoginRequest { username, password }),
        )
        .await
    }

    /// Create a new account. Does not authenticate.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (e.g., username taken).
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &Email,
        password: &str,
    ) -> Result<(), ApiError> {
        self.send_ack(self.inner.client.post(self.url("/users")).json(&RegisterRequest {
            username,
            email: email.as_str(),
            password,
        }))
        .await
    }

    /// Change the authenticated user's role.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the response carries the
    /// updated identity.
    #[instrument(skip(self, token), fields(role = %role))]
    pub async fn update_role(
        &self,
        token: &AccessToken,
        role: Role,
    ) -> Result<Identity, ApiError> {
        self.send(
            self.inner
                .client
                .patch(self.url("/users/role"))
                .bearer_auth(token.expose())
                .json(&UpdateRoleRequest { role }),
        )
        .await
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Fetch the full cart for the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_cart(&self, token: &AccessToken) -> Result<Vec<CartItem>, ApiError> {
        self.send(
            self.inner
                .client
                .get(self.url("/cart"))
                .bearer_auth(token.expose()),
        )
        .await
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (e.g., insufficient stock).
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_cart_item(
        &self,
        token: &AccessToken,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.send_ack(
            self.inner
                .client
                .post(self.url("/cart"))
                .bearer_auth(token.expose())
                .json(&CartMutationRequest {
                    product_id,
                    quantity,
                }),
        )
        .await
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn update_cart_item(
        &self,
        token: &AccessToken,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.send_ack(
            self.inner
                .client
                .put(self.url("/cart"))
                .bearer_auth(token.expose())
                .json(&CartMutationRequest {
                    product_id,
                    quantity,
                }),
        )
        .await
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_cart_item(
        &self,
        token: &AccessToken,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        self.send_ack(
            self.inner
                .client
                .delete(self.url(&format!("/cart/{product_id}")))
                .bearer_auth(token.expose()),
        )
        .await
    }

    /// Remove every item from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &AccessToken) -> Result<(), ApiError> {
        self.send_ack(
            self.inner
                .client
                .delete(self.url("/cart"))
                .bearer_auth(token.expose()),
        )
        .await
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{product_id}");

        // Check cache
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .send(self.inner.client.get(self.url(&format!("/products/{product_id}"))))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, page: Page) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("products:{}:{}", page.page_id, page.page_size);

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .send(
                self.inner
                    .client
                    .get(self.url("/products"))
                    .query(&[("page_id", page.page_id), ("page_size", page.page_size)]),
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Search products by name. Not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str, page: Page) -> Result<Vec<Product>, ApiError> {
        self.send(
            self.inner
                .client
                .get(self.url("/products/search"))
                .query(&[("query", query)])
                .query(&[("page_id", page.page_id), ("page_size", page.page_size)]),
        )
        .await
    }

    /// Get a page of products belonging to a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn list_products_by_category(
        &self,
        category_id: CategoryId,
        page: Page,
    ) -> Result<Vec<Product>, ApiError> {
        self.send(
            self.inner
                .client
                .get(self.url(&format!("/categories/{category_id}/products")))
                .query(&[("page_id", page.page_id), ("page_size", page.page_size)]),
        )
        .await
    }

    /// Get all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> =
            self.send(self.inner.client.get(self.url("/categories"))).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not found or the request fails.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn get_category(&self, category_id: CategoryId) -> Result<Category, ApiError> {
        let cache_key = format!("category:{category_id}");

        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let category: Category = self
            .send(
                self.inner
                    .client
                    .get(self.url(&format!("/categories/{category_id}"))),
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Category(Box::new(category.clone())))
            .await;

        Ok(category)
    }

    // =========================================================================
    // Shop Methods (authenticated, not cached)
    // =========================================================================

    /// Get a page of shops.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn list_shops(&self, token: &AccessToken, page: Page) -> Result<Vec<Shop>, ApiError> {
        self.send(
            self.inner
                .client
                .get(self.url("/shops"))
                .bearer_auth(token.expose())
                .query(&[("page_id", page.page_id), ("page_size", page.page_size)]),
        )
        .await
    }

    /// Get a shop by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the shop is not found or the request fails.
    #[instrument(skip(self, token), fields(shop_id = %shop_id))]
    pub async fn get_shop(&self, token: &AccessToken, shop_id: ShopId) -> Result<Shop, ApiError> {
        self.send(
            self.inner
                .client
                .get(self.url(&format!("/shops/{shop_id}")))
                .bearer_auth(token.expose()),
        )
        .await
    }

    /// Get a page of products belonging to a shop.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(shop_id = %shop_id))]
    pub async fn list_products_by_shop(
        &self,
        token: &AccessToken,
        shop_id: ShopId,
        page: Page,
    ) -> Result<Vec<Product>, ApiError> {
        self.send(
            self.inner
                .client
                .get(self.url(&format!("/shops/{shop_id}/products")))
                .bearer_auth(token.expose())
                .query(&[("page_id", page.page_id), ("page_size", page.page_size)]),
        )
        .await
    }

    // =========================================================================
    // Order Methods (authenticated, not cached)
    // =========================================================================

    /// Place an order from the current cart contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (e.g., empty cart).
    #[instrument(skip(self, token, shipping_address))]
    pub async fn create_order(
        &self,
        token: &AccessToken,
        shipping_address: &str,
        payment_method: &str,
    ) -> Result<Order, ApiError> {
        self.send(
            self.inner
                .client
                .post(self.url("/orders"))
                .bearer_auth(token.expose())
                .json(&CreateOrderRequest {
                    shipping_address,
                    payment_method,
                }),
        )
        .await
    }

    /// Get the authenticated user's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &AccessToken) -> Result<Vec<Order>, ApiError> {
        self.send(
            self.inner
                .client
                .get(self.url("/orders"))
                .bearer_auth(token.expose()),
        )
        .await
    }

    /// Get a single order with its items.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the request fails.
    #[instrument(skip(self, token), fields(order_id = %order_id))]
    pub async fn get_order(&self, token: &AccessToken, order_id: OrderId) -> Result<Order, ApiError> {
        self.send(
            self.inner
                .client
                .get(self.url(&format!("/orders/{order_id}")))
                .bearer_auth(token.expose()),
        )
        .await
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate all cached catalog data.
    pub async fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// Extract the message from an API error body, falling back to a snippet of
/// the raw body when it is not the expected shape.
fn error_message(text: &str) -> String {
    serde_json::from_str::<ErrorBody>(text).map_or_else(
        |_| {
            let snippet: String = text.chars().take(200).collect();
            if snippet.is_empty() {
                "(empty response body)".to_string()
            } else {
                snippet
            }
        },
        |body| body.error,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_parses_error_body() {
        assert_eq!(error_message(r#"{"error": "insufficient stock"}"#), "insufficient stock");
    }

    #[test]
    fn test_error_message_falls_back_to_snippet() {
        assert_eq!(error_message("<html>bad gateway</html>"), "<html>bad gateway</html>");
        assert_eq!(error_message(""), "(empty response body)");
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("product not found".to_string());
        assert_eq!(err.to_string(), "not found: product not found");

        let err = ApiError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "api error (500): boom");
    }
}
