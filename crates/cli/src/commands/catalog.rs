//! Catalog commands.

use bazaar_client::api::Page;
use bazaar_core::ProductId;

use super::App;

/// List a page of products.
pub async fn list(app: &App, page: u32, page_size: u32) -> Result<(), Box<dyn std::error::Error>> {
    let products = app
        .api
        .list_products(Page {
            page_id: page,
            page_size,
        })
        .await?;

    for product in &products {
        println!(
            "{:<32} {:>8}  stock={:<4} [{}]",
            product.name, product.price, product.stock_quantity, product.id,
        );
    }
    println!("{} product(s), page {page}", products.len());
    Ok(())
}

/// Search products by name.
pub async fn search(app: &App, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let products = app.api.search_products(query, Page::default()).await?;

    for product in &products {
        println!("{:<32} {:>8}  [{}]", product.name, product.price, product.id);
    }
    println!("{} match(es) for \"{query}\"", products.len());
    Ok(())
}

/// Show a single product.
pub async fn show(app: &App, product_id: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    let product = app.api.get_product(product_id).await?;

    println!("{}", product.name);
    println!("  price: {}", product.price);
    println!("  stock: {}", product.stock_quantity);
    println!("  shop:  {}", product.shop_id);
    if !product.description.is_empty() {
        println!("  {}", product.description);
    }
    Ok(())
}
