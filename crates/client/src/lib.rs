//! Bazaar client SDK.
//!
//! A browser-style client core for the Bazaar marketplace API. The SDK owns
//! the state a view layer renders from: the current session, the role-gating
//! decision, and a synchronized mirror of the server-side cart. All
//! presentation concerns (rendering, navigation, toasts) live outside this
//! crate; callers observe state and invoke operations.
//!
//! # Architecture
//!
//! - [`api::ApiClient`] - thin typed REST calls against the marketplace API,
//!   with `moka`-cached catalog reads
//! - [`credentials::CredentialStore`] - durable single-slot bearer credential
//!   persistence, degrading to memory-only when storage is unavailable
//! - [`session::SessionManager`] - sole owner of session state; resolves the
//!   stored credential to an identity and publishes transitions on a watch
//!   channel, tagged with a monotonic generation counter
//! - [`authz`] - a pure decision function from session state and a required
//!   role to allow/deny/pending
//! - [`cart::CartCache`] - local mirror of the server cart; write-then-refetch
//!   mutations, generation-guarded against stale responses
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_client::{ApiClient, CartCache, ClientConfig, CredentialStore, SessionManager};
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::new(&config);
//! let store = CredentialStore::new(config.credential_file.clone());
//! let session = SessionManager::new(api.clone(), store);
//!
//! // Rehydrate the session from the stored credential.
//! session.resolve().await;
//!
//! let cart = CartCache::new(api.clone(), session.clone());
//! tokio::spawn({
//!     let cart = cart.clone();
//!     async move { cart.run().await }
//! });
//!
//! session.login("alice", "hunter2").await?;
//! cart.add(product_id, 2).await?;
//! println!("total: {}", cart.total());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod authz;
pub mod cart;
pub mod config;
pub mod credentials;
pub mod session;

pub use api::{ApiClient, ApiError};
pub use authz::{Access, Redirect};
pub use cart::{CartCache, CartError, CartState, CartStatus};
pub use config::{ClientConfig, ConfigError};
pub use credentials::CredentialStore;
pub use session::{Session, SessionError, SessionManager, SessionSnapshot, SessionState};
