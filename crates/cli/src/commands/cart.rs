//! Cart commands.

use bazaar_client::CartStatus;
use bazaar_core::ProductId;

use super::App;

/// Show the cart contents and total.
pub fn show(app: &App) {
    match app.cart.status() {
        CartStatus::Empty => println!("Cart is empty (not logged in?)"),
        CartStatus::Error => {
            let reason = app.cart.error().unwrap_or_else(|| "unknown".to_string());
            println!("Cart unavailable: {reason}");
        }
        CartStatus::Loading | CartStatus::Ready => {
            let items = app.cart.items();
            if items.is_empty() {
                println!("Cart is empty");
                return;
            }
            for item in &items {
                println!(
                    "{:>3} x {:<32} @ {:>8}  = {:>8}  [{}]",
                    item.quantity,
                    item.product_name,
                    item.price,
                    item.line_total(),
                    item.product_id,
                );
            }
            println!("Total: {}", app.cart.total());
        }
    }
}

/// Add a product to the cart.
pub async fn add(
    app: &App,
    product_id: ProductId,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    app.cart.add(product_id, quantity).await?;
    println!("Added. Cart total: {}", app.cart.total());
    Ok(())
}

/// Set the quantity of a product already in the cart.
pub async fn update(
    app: &App,
    product_id: ProductId,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    app.cart.update(product_id, quantity).await?;
    println!("Updated. Cart total: {}", app.cart.total());
    Ok(())
}

/// Remove a product from the cart.
pub async fn remove(app: &App, product_id: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    app.cart.remove(product_id).await?;
    println!("Removed. Cart total: {}", app.cart.total());
    Ok(())
}

/// Remove every item from the cart.
pub async fn clear(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    app.cart.clear().await?;
    println!("Cart cleared");
    Ok(())
}
