//! Cart mirroring: write-then-refetch, guards, and stale-response discard.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use bazaar_core::Role;
use bazaar_client::{CartError, CartStatus, SessionState};
use bazaar_integration_tests::TestContext;
use rust_decimal::Decimal;

/// Log in a seeded buyer and reconcile the cart once.
async fn login(ctx: &TestContext) {
    ctx.market.seed_user("alice", "hunter2", Role::Buyer);
    ctx.session.resolve().await;
    ctx.session.login("alice", "hunter2").await.unwrap();
    ctx.cart.sync().await;
}

#[tokio::test]
async fn sync_after_login_reaches_ready() {
    let ctx = TestContext::new().await;
    login(&ctx).await;

    assert_eq!(ctx.cart.status(), CartStatus::Ready);
    assert!(ctx.cart.items().is_empty());
}

#[tokio::test]
async fn add_creates_a_single_entry_with_the_requested_quantity() {
    let ctx = TestContext::new().await;
    let mug = ctx.market.seed_product("Ceramic Mug", 12, 50);
    login(&ctx).await;

    ctx.cart.add(mug, 2).await.unwrap();

    let items = ctx.cart.items();
    assert_eq!(items.len(), 1);
    let item = items.first().unwrap();
    assert_eq!(item.product_id, mug);
    assert_eq!(item.quantity, 2);
    assert_eq!(ctx.cart.status(), CartStatus::Ready);
    // One write, one refetch.
    assert_eq!(ctx.market.hits("POST /cart"), 1);
    assert_eq!(ctx.market.hits("GET /cart"), 2);
}

#[tokio::test]
async fn failed_add_leaves_the_mirror_untouched() {
    let ctx = TestContext::new().await;
    let mug = ctx.market.seed_product("Ceramic Mug", 12, 50);
    let rare = ctx.market.seed_product("Sold Out Lamp", 80, 0);
    login(&ctx).await;
    ctx.cart.add(mug, 1).await.unwrap();

    let before = ctx.cart.state();
    let fetches_before = ctx.market.hits("GET /cart");

    let err = ctx.cart.add(rare, 1).await.unwrap_err();
    assert!(matches!(err, CartError::Api(_)));

    // No refetch on failure, and the mirror is exactly what it was.
    assert_eq!(ctx.cart.state(), before);
    assert_eq!(ctx.market.hits("GET /cart"), fetches_before);
}

#[tokio::test]
async fn mutations_without_a_session_are_rejected_without_network() {
    let ctx = TestContext::new().await;
    let mug = ctx.market.seed_product("Ceramic Mug", 12, 50);
    ctx.session.resolve().await;
    ctx.cart.sync().await;

    let err = ctx.cart.add(mug, 1).await.unwrap_err();
    assert!(matches!(err, CartError::AuthenticationRequired));

    let err = ctx.cart.clear().await.unwrap_err();
    assert!(matches!(err, CartError::AuthenticationRequired));

    assert_eq!(ctx.market.hits("POST /cart"), 0);
    assert_eq!(ctx.market.hits("DELETE /cart"), 0);
}

#[tokio::test]
async fn update_and_remove_follow_the_refetch_path() {
    let ctx = TestContext::new().await;
    let mug = ctx.market.seed_product("Ceramic Mug", 12, 50);
    let lamp = ctx.market.seed_product("Desk Lamp", 30, 10);
    login(&ctx).await;
    ctx.cart.add(mug, 1).await.unwrap();
    ctx.cart.add(lamp, 1).await.unwrap();

    ctx.cart.update(mug, 5).await.unwrap();
    let items = ctx.cart.items();
    assert_eq!(
        items.iter().find(|item| item.product_id == mug).unwrap().quantity,
        5
    );

    ctx.cart.remove(lamp).await.unwrap();
    let items = ctx.cart.items();
    assert_eq!(items.len(), 1);
    assert!(items.iter().all(|item| item.product_id == mug));
    assert_eq!(ctx.cart.status(), CartStatus::Ready);
}

#[tokio::test]
async fn clear_yields_ready_with_zero_items() {
    let ctx = TestContext::new().await;
    let mug = ctx.market.seed_product("Ceramic Mug", 12, 50);
    login(&ctx).await;
    ctx.cart.add(mug, 3).await.unwrap();
    assert!(!ctx.cart.items().is_empty());

    ctx.cart.clear().await.unwrap();

    // The cart was observed from the server: Ready, not the signed-out Empty.
    assert_eq!(ctx.cart.status(), CartStatus::Ready);
    assert!(ctx.cart.items().is_empty());
    assert_eq!(ctx.cart.total(), Decimal::ZERO);
}

#[tokio::test]
async fn total_sums_price_times_quantity() {
    let ctx = TestContext::new().await;
    let user_id = ctx.market.seed_user("alice", "hunter2", Role::Buyer);
    ctx.market.seed_cart_item(user_id, "Ceramic Mug", 10, 2);
    ctx.market.seed_cart_item(user_id, "Desk Lamp", 5, 3);
    ctx.session.resolve().await;
    ctx.session.login("alice", "hunter2").await.unwrap();
    ctx.cart.sync().await;

    assert_eq!(ctx.cart.total(), Decimal::from(35));
}

#[tokio::test]
async fn total_is_zero_before_the_mirror_is_ready() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.cart.status(), CartStatus::Empty);
    assert_eq!(ctx.cart.total(), Decimal::ZERO);
}

#[tokio::test]
async fn stale_fetch_is_discarded_after_logout() {
    let ctx = TestContext::new().await;
    let user_id = ctx.market.seed_user("alice", "hunter2", Role::Buyer);
    ctx.market.seed_cart_item(user_id, "Ceramic Mug", 12, 1);
    ctx.session.resolve().await;
    ctx.session.login("alice", "hunter2").await.unwrap();

    // Slow the cart endpoint down, then start a sync that will be in flight
    // across the logout.
    ctx.market.set_cart_fetch_delay(Duration::from_millis(300));
    let stale_sync = tokio::spawn({
        let cart = ctx.cart.clone();
        async move { cart.sync().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Logout while the fetch is suspended; the observer reconciles to Empty.
    ctx.session.logout();
    ctx.cart.sync().await;
    assert_eq!(ctx.cart.status(), CartStatus::Empty);

    // When the delayed response finally lands it carries a dead generation:
    // it must be discarded, leaving the logged-out outcome in place.
    stale_sync.await.unwrap();
    assert_eq!(ctx.cart.status(), CartStatus::Empty);
    assert!(ctx.cart.items().is_empty());
    assert_eq!(ctx.cart.total(), Decimal::ZERO);
}

#[tokio::test]
async fn observer_loop_tracks_session_transitions() {
    let ctx = TestContext::new().await;
    let user_id = ctx.market.seed_user("alice", "hunter2", Role::Buyer);
    ctx.market.seed_cart_item(user_id, "Ceramic Mug", 12, 2);

    let session = ctx.fresh_session();
    let cart = ctx.fresh_cart(&session);
    let observer = tokio::spawn({
        let cart = cart.clone();
        async move { cart.run().await }
    });

    session.resolve().await;
    session.login("alice", "hunter2").await.unwrap();

    // Give the observer a moment to react to the transition.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(cart.status(), CartStatus::Ready);
    assert_eq!(cart.items().len(), 1);

    session.logout();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(cart.status(), CartStatus::Empty);
    assert!(matches!(session.state(), SessionState::Unauthenticated));

    observer.abort();
}
