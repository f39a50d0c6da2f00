//! Catalog reads and caching.

#![allow(clippy::unwrap_used)]

use bazaar_client::ApiError;
use bazaar_client::api::Page;
use bazaar_core::ProductId;
use bazaar_integration_tests::TestContext;

#[tokio::test]
async fn product_list_is_served_from_cache_on_repeat_reads() {
    let ctx = TestContext::new().await;
    ctx.market.seed_product("Ceramic Mug", 12, 50);
    ctx.market.seed_product("Desk Lamp", 30, 10);

    let first = ctx.api.list_products(Page::default()).await.unwrap();
    let second = ctx.api.list_products(Page::default()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    // Second read was a cache hit.
    assert_eq!(ctx.market.hits("GET /products"), 1);
}

#[tokio::test]
async fn cache_invalidation_forces_a_fresh_read() {
    let ctx = TestContext::new().await;
    ctx.market.seed_product("Ceramic Mug", 12, 50);

    ctx.api.list_products(Page::default()).await.unwrap();
    ctx.api.invalidate_catalog().await;
    ctx.api.list_products(Page::default()).await.unwrap();

    assert_eq!(ctx.market.hits("GET /products"), 2);
}

#[tokio::test]
async fn search_bypasses_the_cache() {
    let ctx = TestContext::new().await;
    ctx.market.seed_product("Ceramic Mug", 12, 50);
    ctx.market.seed_product("Travel Mug", 18, 20);
    ctx.market.seed_product("Desk Lamp", 30, 10);

    let hits = ctx.api.search_products("mug", Page::default()).await.unwrap();
    assert_eq!(hits.len(), 2);

    ctx.api.search_products("mug", Page::default()).await.unwrap();
    assert_eq!(ctx.market.hits("GET /products/search"), 2);
}

#[tokio::test]
async fn get_product_maps_missing_to_not_found() {
    let ctx = TestContext::new().await;

    let err = ctx.api.get_product(ProductId::random()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn get_product_caches_by_id() {
    let ctx = TestContext::new().await;
    let mug = ctx.market.seed_product("Ceramic Mug", 12, 50);

    let first = ctx.api.get_product(mug).await.unwrap();
    let second = ctx.api.get_product(mug).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(ctx.market.hits("GET /products/{id}"), 1);
}

#[tokio::test]
async fn categories_are_cached() {
    let ctx = TestContext::new().await;
    ctx.market.seed_category("Kitchen");
    ctx.market.seed_category("Lighting");

    let first = ctx.api.list_categories().await.unwrap();
    let second = ctx.api.list_categories().await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(ctx.market.hits("GET /categories"), 1);
}

#[tokio::test]
async fn shops_are_visible_to_authenticated_users() {
    let ctx = TestContext::new().await;
    let owner = ctx.market.seed_user("sally", "pw", bazaar_core::Role::Seller);
    ctx.market.seed_shop(owner, "Sally's Ceramics");
    ctx.session.resolve().await;
    ctx.session.login("sally", "pw").await.unwrap();

    let token = match ctx.session.state() {
        bazaar_client::SessionState::Authenticated(session) => session.token,
        _ => unreachable!("login succeeded"),
    };

    let shops = ctx.api.list_shops(&token, Page::default()).await.unwrap();
    assert_eq!(shops.len(), 1);
    assert_eq!(shops.first().unwrap().owner_id, owner);
}
