//! Wire types for the marketplace API.
//!
//! These mirror the JSON bodies the API produces and consumes. Response
//! timestamps arrive pre-formatted by the server, so they are carried as
//! opaque strings rather than parsed datetimes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{
    CartItemId, CategoryId, Email, OrderId, OrderItemId, ProductId, Role, ShopId, UserId,
};

// =============================================================================
// Users & Sessions
// =============================================================================

/// A resolved user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub role: Role,
}

/// Body of `POST /users/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful login response.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: Identity,
}

/// Body of `POST /users`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `PATCH /users/role`.
#[derive(Debug, Serialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

// =============================================================================
// Cart
// =============================================================================

/// A single cart line as returned by `GET /cart`.
///
/// `price` is a snapshot taken when the item was added, not necessarily the
/// live product price. Items are unique by `product_id` within a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Decimal,
    pub image_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CartItem {
    /// Price times quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Body of `POST /cart` and `PUT /cart`.
#[derive(Debug, Serialize)]
pub struct CartMutationRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

// =============================================================================
// Catalog
// =============================================================================

/// Pagination window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub page_id: u32,
    /// Items per page (the API accepts 5-10).
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page_id: 1,
            page_size: 10,
        }
    }
}

/// A product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: u32,
    pub shop_id: ShopId,
    pub category_id: CategoryId,
    pub image_url: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A seller's shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub description: String,
    pub owner_id: UserId,
    pub created_at: String,
    pub updated_at: String,
}

// =============================================================================
// Orders
// =============================================================================

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// A single line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Decimal,
    pub image_url: String,
    pub created_at: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub payment_method: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Body of `POST /orders`.
#[derive(Debug, Serialize)]
pub struct CreateOrderRequest<'a> {
    pub shipping_address: &'a str,
    pub payment_method: &'a str,
}
