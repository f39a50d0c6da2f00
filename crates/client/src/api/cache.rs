//! Cache types for catalog API responses.

use crate::api::types::{Category, Product};

/// Cached value types.
///
/// Keys are formatted strings (`product:{id}`, `products:{page}:{size}`,
/// `category:{id}`, `categories`), one namespace per read endpoint.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Category(Box<Category>),
    Categories(Vec<Category>),
}
