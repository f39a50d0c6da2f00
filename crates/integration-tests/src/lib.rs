//! Integration tests for the Bazaar client SDK.
//!
//! Tests drive the real SDK (HTTP and all) against an in-process mock
//! marketplace server, so the full request path - serialization, bearer
//! headers, error mapping, state machines - is exercised end to end.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_lifecycle` - credential resolution, login/logout, role updates
//! - `cart_sync` - cart mirroring, write-then-refetch, stale-response discard
//! - `catalog` - catalog reads and caching

#![allow(clippy::missing_panics_doc)] // test support code panics on harness failures

pub mod market;

use tempfile::TempDir;
use url::Url;

use bazaar_client::{ApiClient, CartCache, ClientConfig, CredentialStore, SessionManager};
use bazaar_core::AccessToken;

use market::MockMarket;

/// A fully wired SDK pointed at a fresh mock server, with a scratch
/// credential slot.
pub struct TestContext {
    pub market: MockMarket,
    pub config: ClientConfig,
    pub api: ApiClient,
    pub session: SessionManager,
    pub cart: CartCache,
    _credential_dir: TempDir,
}

impl TestContext {
    /// Spawn a mock server and build the SDK against it.
    pub async fn new() -> Self {
        let market = MockMarket::spawn().await;
        let credential_dir = tempfile::tempdir().expect("create scratch dir");

        let config = ClientConfig {
            api_url: Url::parse(&market.base_url).expect("parse mock server url"),
            credential_file: credential_dir.path().join("credential"),
        };

        let api = ApiClient::new(&config);
        let store = CredentialStore::new(config.credential_file.clone());
        let session = SessionManager::new(api.clone(), store);
        let cart = CartCache::new(api.clone(), session.clone());

        Self {
            market,
            config,
            api,
            session,
            cart,
            _credential_dir: credential_dir,
        }
    }

    /// Write a raw token into the credential slot, as if a previous run had
    /// persisted it.
    pub fn store_credential(&self, token: &str) {
        CredentialStore::new(self.config.credential_file.clone()).set(&AccessToken::new(token));
    }

    /// Open the credential slot the way a fresh process would.
    pub fn reopen_store(&self) -> CredentialStore {
        CredentialStore::new(self.config.credential_file.clone())
    }

    /// Build a session manager the way a restarted process would: a fresh
    /// instance reading the persisted credential slot.
    pub fn fresh_session(&self) -> SessionManager {
        SessionManager::new(self.api.clone(), self.reopen_store())
    }

    /// Build a cart cache bound to the given session.
    pub fn fresh_cart(&self, session: &SessionManager) -> CartCache {
        CartCache::new(self.api.clone(), session.clone())
    }
}
