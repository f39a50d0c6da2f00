//! In-process mock marketplace server.
//!
//! Serves the subset of the marketplace API the SDK depends on, backed by
//! in-memory state the tests can seed and inspect. Binds an ephemeral port
//! per instance so tests run in parallel without interference.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use rust_decimal::Decimal;

use bazaar_client::api::{CartItem, Category, Identity, Order, OrderItem, OrderStatus, Product, Shop};
use bazaar_core::{CartItemId, CategoryId, Email, OrderId, OrderItemId, ProductId, Role, ShopId, UserId};

/// Fixed timestamp string used on seeded records; the SDK treats these as
/// opaque.
const TIMESTAMP: &str = "2025-04-01 09:30:00 +0000 UTC";

/// A seeded account.
#[derive(Debug, Clone)]
pub struct MockUser {
    pub id: UserId,
    pub username: String,
    pub password: String,
    pub email: Email,
    pub role: Role,
}

impl MockUser {
    fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Shared server state.
#[derive(Default)]
pub struct MarketState {
    users: Mutex<Vec<MockUser>>,
    tokens: Mutex<HashMap<String, UserId>>,
    carts: Mutex<HashMap<UserId, Vec<CartItem>>>,
    products: Mutex<HashMap<ProductId, Product>>,
    categories: Mutex<Vec<Category>>,
    shops: Mutex<Vec<Shop>>,
    orders: Mutex<HashMap<UserId, Vec<Order>>>,
    hits: Mutex<HashMap<&'static str, usize>>,
    next_token: AtomicU64,
    cart_fetch_delay_ms: AtomicU64,
}

impl MarketState {
    fn hit(&self, route: &'static str) {
        if let Ok(mut hits) = self.hits.lock() {
            *hits.entry(route).or_insert(0) += 1;
        }
    }
}

/// Handle to a running mock server.
pub struct MockMarket {
    pub base_url: String,
    state: Arc<MarketState>,
}

impl MockMarket {
    /// Start a server on an ephemeral port.
    pub async fn spawn() -> Self {
        let state = Arc::new(MarketState::default());
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Create an account and return its ID.
    pub fn seed_user(&self, username: &str, password: &str, role: Role) -> UserId {
        let user = MockUser {
            id: UserId::random(),
            username: username.to_string(),
            password: password.to_string(),
            email: Email::parse(&format!("{username}@example.com")).expect("seed email"),
            role,
        };
        let id = user.id;
        self.state.users.lock().expect("users lock").push(user);
        id
    }

    /// Issue a valid bearer token for a seeded user.
    pub fn issue_token(&self, user_id: UserId) -> String {
        let token = format!(
            "mock-token-{}",
            self.state.next_token.fetch_add(1, Ordering::Relaxed)
        );
        self.state
            .tokens
            .lock()
            .expect("tokens lock")
            .insert(token.clone(), user_id);
        token
    }

    /// Create a product listing and return its ID.
    pub fn seed_product(&self, name: &str, price: u32, stock_quantity: u32) -> ProductId {
        let product = Product {
            id: ProductId::random(),
            name: name.to_string(),
            description: String::new(),
            price: price.into(),
            stock_quantity,
            shop_id: ShopId::random(),
            category_id: CategoryId::random(),
            image_url: String::new(),
            created_at: TIMESTAMP.to_string(),
            updated_at: TIMESTAMP.to_string(),
        };
        let id = product.id;
        self.state
            .products
            .lock()
            .expect("products lock")
            .insert(id, product);
        id
    }

    /// Create a category and return its ID.
    pub fn seed_category(&self, name: &str) -> CategoryId {
        let category = Category {
            id: CategoryId::random(),
            name: name.to_string(),
            description: String::new(),
            created_at: TIMESTAMP.to_string(),
            updated_at: TIMESTAMP.to_string(),
        };
        let id = category.id;
        self.state
            .categories
            .lock()
            .expect("categories lock")
            .push(category);
        id
    }

    /// Create a shop owned by a seeded user and return its ID.
    pub fn seed_shop(&self, owner_id: UserId, name: &str) -> ShopId {
        let shop = Shop {
            id: ShopId::random(),
            name: name.to_string(),
            description: String::new(),
            owner_id,
            created_at: TIMESTAMP.to_string(),
            updated_at: TIMESTAMP.to_string(),
        };
        let id = shop.id;
        self.state.shops.lock().expect("shops lock").push(shop);
        id
    }

    /// Place a line directly into a user's server-side cart.
    pub fn seed_cart_item(&self, user_id: UserId, name: &str, price: u32, quantity: u32) {
        let item = CartItem {
            id: CartItemId::random(),
            product_id: ProductId::random(),
            product_name: name.to_string(),
            quantity,
            price: price.into(),
            image_url: String::new(),
            created_at: TIMESTAMP.to_string(),
            updated_at: TIMESTAMP.to_string(),
        };
        self.state
            .carts
            .lock()
            .expect("carts lock")
            .entry(user_id)
            .or_default()
            .push(item);
    }

    // =========================================================================
    // Test Controls & Inspection
    // =========================================================================

    /// Delay every subsequent `GET /cart` response.
    pub fn set_cart_fetch_delay(&self, delay: Duration) {
        self.state
            .cart_fetch_delay_ms
            .store(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    /// How many times a route was served (e.g. `"GET /users/me"`).
    pub fn hits(&self, route: &str) -> usize {
        self.state
            .hits
            .lock()
            .expect("hits lock")
            .get(route)
            .copied()
            .unwrap_or(0)
    }

    /// Total requests served across all routes.
    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().expect("hits lock").values().sum()
    }
}

// =============================================================================
// Router & Handlers
// =============================================================================

fn router(state: Arc<MarketState>) -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/login", post(login))
        .route("/users/me", get(current_user))
        .route("/users/role", patch(update_role))
        .route("/cart", get(fetch_cart).post(add_to_cart).put(update_cart_item).delete(clear_cart))
        .route("/cart/{product_id}", delete(remove_cart_item))
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/products/{product_id}", get(get_product))
        .route("/categories", get(list_categories))
        .route("/shops", get(list_shops))
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/{order_id}", get(get_order))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Resolve the bearer token in `headers` to a user, or produce the 401 the
/// real API sends.
fn authenticate(state: &MarketState, headers: &HeaderMap) -> Result<MockUser, Response> {
    let token = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "authorization header missing"))?;

    let user_id = state
        .tokens
        .lock()
        .expect("tokens lock")
        .get(token)
        .copied()
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "invalid token"))?;

    state
        .users
        .lock()
        .expect("users lock")
        .iter()
        .find(|user| user.id == user_id)
        .cloned()
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "unknown user"))
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

async fn create_user(
    State(state): State<Arc<MarketState>>,
    Json(body): Json<RegisterBody>,
) -> Response {
    state.hit("POST /users");

    let mut users = state.users.lock().expect("users lock");
    if users.iter().any(|user| user.username == body.username) {
        return error(StatusCode::CONFLICT, "username already taken");
    }

    let Ok(email) = Email::parse(&body.email) else {
        return error(StatusCode::BAD_REQUEST, "invalid email");
    };

    let user = MockUser {
        id: UserId::random(),
        username: body.username,
        password: body.password,
        email,
        role: Role::Buyer,
    };
    let identity = user.identity();
    users.push(user);

    Json(identity).into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<Arc<MarketState>>, Json(body): Json<LoginBody>) -> Response {
    state.hit("POST /users/login");

    let user = state
        .users
        .lock()
        .expect("users lock")
        .iter()
        .find(|user| user.username == body.username && user.password == body.password)
        .cloned();

    let Some(user) = user else {
        return error(StatusCode::UNAUTHORIZED, "invalid username or password");
    };

    let token = format!(
        "mock-token-{}",
        state.next_token.fetch_add(1, Ordering::Relaxed)
    );
    state
        .tokens
        .lock()
        .expect("tokens lock")
        .insert(token.clone(), user.id);

    Json(json!({ "access_token": token, "user": user.identity() })).into_response()
}

async fn current_user(State(state): State<Arc<MarketState>>, headers: HeaderMap) -> Response {
    state.hit("GET /users/me");

    match authenticate(&state, &headers) {
        Ok(user) => Json(user.identity()).into_response(),
        Err(response) => response,
    }
}

#[derive(Deserialize)]
struct UpdateRoleBody {
    role: Role,
}

async fn update_role(
    State(state): State<Arc<MarketState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateRoleBody>,
) -> Response {
    state.hit("PATCH /users/role");

    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let mut users = state.users.lock().expect("users lock");
    let Some(user) = users.iter_mut().find(|candidate| candidate.id == user.id) else {
        return error(StatusCode::NOT_FOUND, "user not found");
    };
    user.role = body.role;

    Json(user.identity()).into_response()
}

async fn fetch_cart(State(state): State<Arc<MarketState>>, headers: HeaderMap) -> Response {
    state.hit("GET /cart");

    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let delay = state.cart_fetch_delay_ms.load(Ordering::Relaxed);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let items = state
        .carts
        .lock()
        .expect("carts lock")
        .get(&user.id)
        .cloned()
        .unwrap_or_default();

    Json(items).into_response()
}

#[derive(Deserialize)]
struct CartMutationBody {
    product_id: ProductId,
    quantity: u32,
}

async fn add_to_cart(
    State(state): State<Arc<MarketState>>,
    headers: HeaderMap,
    Json(body): Json<CartMutationBody>,
) -> Response {
    state.hit("POST /cart");

    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let product = state
        .products
        .lock()
        .expect("products lock")
        .get(&body.product_id)
        .cloned();

    let Some(product) = product else {
        return error(StatusCode::NOT_FOUND, "product not found");
    };

    if product.stock_quantity < body.quantity {
        return error(StatusCode::BAD_REQUEST, "insufficient stock");
    }

    let mut carts = state.carts.lock().expect("carts lock");
    let items = carts.entry(user.id).or_default();
    if let Some(item) = items.iter_mut().find(|item| item.product_id == body.product_id) {
        item.quantity += body.quantity;
    } else {
        items.push(CartItem {
            id: CartItemId::random(),
            product_id: product.id,
            product_name: product.name,
            quantity: body.quantity,
            price: product.price,
            image_url: product.image_url,
            created_at: TIMESTAMP.to_string(),
            updated_at: TIMESTAMP.to_string(),
        });
    }

    Json(json!({ "message": "added to cart" })).into_response()
}

async fn update_cart_item(
    State(state): State<Arc<MarketState>>,
    headers: HeaderMap,
    Json(body): Json<CartMutationBody>,
) -> Response {
    state.hit("PUT /cart");

    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let mut carts = state.carts.lock().expect("carts lock");
    let Some(item) = carts
        .entry(user.id)
        .or_default()
        .iter_mut()
        .find(|item| item.product_id == body.product_id)
    else {
        return error(StatusCode::NOT_FOUND, "item not found in cart");
    };
    item.quantity = body.quantity;

    Json(json!({ "message": "cart updated" })).into_response()
}

async fn remove_cart_item(
    State(state): State<Arc<MarketState>>,
    headers: HeaderMap,
    Path(product_id): Path<ProductId>,
) -> Response {
    state.hit("DELETE /cart/{product_id}");

    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    state
        .carts
        .lock()
        .expect("carts lock")
        .entry(user.id)
        .or_default()
        .retain(|item| item.product_id != product_id);

    Json(json!({ "message": "removed from cart" })).into_response()
}

async fn clear_cart(State(state): State<Arc<MarketState>>, headers: HeaderMap) -> Response {
    state.hit("DELETE /cart");

    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    state.carts.lock().expect("carts lock").insert(user.id, Vec::new());

    Json(json!({ "message": "cart cleared" })).into_response()
}

async fn list_products(State(state): State<Arc<MarketState>>) -> Response {
    state.hit("GET /products");

    let mut products: Vec<Product> = state
        .products
        .lock()
        .expect("products lock")
        .values()
        .cloned()
        .collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));

    Json(products).into_response()
}

#[derive(Deserialize)]
struct SearchQuery {
    query: String,
}

async fn search_products(
    State(state): State<Arc<MarketState>>,
    axum::extract::Query(params): axum::extract::Query<SearchQuery>,
) -> Response {
    state.hit("GET /products/search");

    let needle = params.query.to_lowercase();
    let mut products: Vec<Product> = state
        .products
        .lock()
        .expect("products lock")
        .values()
        .filter(|product| product.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));

    Json(products).into_response()
}

async fn get_product(
    State(state): State<Arc<MarketState>>,
    Path(product_id): Path<ProductId>,
) -> Response {
    state.hit("GET /products/{id}");

    let product = state
        .products
        .lock()
        .expect("products lock")
        .get(&product_id)
        .cloned();

    product.map_or_else(
        || error(StatusCode::NOT_FOUND, "product not found"),
        |product| Json(product).into_response(),
    )
}

async fn list_categories(State(state): State<Arc<MarketState>>) -> Response {
    state.hit("GET /categories");

    let categories: Vec<Category> = state
        .categories
        .lock()
        .expect("categories lock")
        .clone();

    Json(categories).into_response()
}

async fn list_shops(State(state): State<Arc<MarketState>>, headers: HeaderMap) -> Response {
    state.hit("GET /shops");

    if let Err(response) = authenticate(&state, &headers) {
        return response;
    }

    let shops: Vec<Shop> = state.shops.lock().expect("shops lock").clone();
    Json(shops).into_response()
}

#[derive(Deserialize)]
struct CreateOrderBody {
    shipping_address: String,
    payment_method: String,
}

async fn create_order(
    State(state): State<Arc<MarketState>>,
    headers: HeaderMap,
    Json(body): Json<CreateOrderBody>,
) -> Response {
    state.hit("POST /orders");

    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let mut carts = state.carts.lock().expect("carts lock");
    let items = carts.entry(user.id).or_default();
    if items.is_empty() {
        return error(StatusCode::BAD_REQUEST, "cart is empty");
    }

    let total_amount: Decimal = items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum();

    let order = Order {
        id: OrderId::random(),
        user_id: user.id,
        status: OrderStatus::Pending,
        total_amount,
        shipping_address: body.shipping_address,
        payment_method: body.payment_method,
        created_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
        items: items
            .iter()
            .map(|item| OrderItem {
                id: OrderItemId::random(),
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                price: item.price,
                image_url: item.image_url.clone(),
                created_at: TIMESTAMP.to_string(),
            })
            .collect(),
    };

    // Ordering consumes the cart.
    items.clear();
    drop(carts);

    state
        .orders
        .lock()
        .expect("orders lock")
        .entry(user.id)
        .or_default()
        .push(order.clone());

    Json(order).into_response()
}

async fn list_orders(State(state): State<Arc<MarketState>>, headers: HeaderMap) -> Response {
    state.hit("GET /orders");

    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let orders = state
        .orders
        .lock()
        .expect("orders lock")
        .get(&user.id)
        .cloned()
        .unwrap_or_default();

    Json(orders).into_response()
}

async fn get_order(
    State(state): State<Arc<MarketState>>,
    headers: HeaderMap,
    Path(order_id): Path<OrderId>,
) -> Response {
    state.hit("GET /orders/{id}");

    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let order = state
        .orders
        .lock()
        .expect("orders lock")
        .get(&user.id)
        .and_then(|orders| orders.iter().find(|order| order.id == order_id).cloned());

    order.map_or_else(
        || error(StatusCode::NOT_FOUND, "order not found"),
        |order| Json(order).into_response(),
    )
}
