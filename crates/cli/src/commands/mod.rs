//! Command implementations.

pub mod cart;
pub mod catalog;
pub mod session;

use bazaar_client::{ApiClient, CartCache, ClientConfig, CredentialStore, SessionManager};

/// The wired-up SDK a command operates on.
pub struct App {
    pub api: ApiClient,
    pub session: SessionManager,
    pub cart: CartCache,
}

impl App {
    /// Build the SDK from the environment and rehydrate the stored session.
    ///
    /// Commands are one-shot, so the cart is reconciled once here instead of
    /// spawning the observer loop.
    pub async fn bootstrap() -> Result<Self, Box<dyn std::error::Error>> {
        let config = ClientConfig::from_env()?;
        let api = ApiClient::new(&config);
        let store = CredentialStore::new(config.credential_file.clone());
        let session = SessionManager::new(api.clone(), store);

        session.resolve().await;

        let cart = CartCache::new(api.clone(), session.clone());
        cart.sync().await;

        Ok(Self { api, session, cart })
    }
}
