//! Session lifecycle management.
//!
//! # Architecture
//!
//! The [`SessionManager`] is the sole writer of session state. It resolves
//! the stored credential to an identity at startup, performs login, register,
//! logout, and role updates, and publishes every transition on a
//! `tokio::sync::watch` channel so dependents (the cart cache, view code) can
//! observe it.
//!
//! Each transition bumps a monotonic **generation** counter carried in the
//! published [`SessionSnapshot`]. In-flight requests capture the generation
//! at issue time and discard their result if the counter moved while they
//! were suspended, so a response from a dead session can never be applied.
//!
//! Concurrent `login` calls are intentionally not coalesced: if two race, the
//! last response to land wins. Re-resolution happens only on credential
//! changes, never by polling.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use bazaar_core::{AccessToken, Email, Role};

use crate::api::{ApiClient, ApiError, Identity};
use crate::credentials::CredentialStore;

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Username/password rejected by the server.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The operation requires an authenticated session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The underlying API call failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),
}

/// An authenticated session: the resolved identity plus the credential that
/// produced it.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub token: AccessToken,
}

/// Current phase of the session state machine.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// Startup: a stored credential may still be resolving.
    #[default]
    Resolving,
    /// A credential resolved to an identity.
    Authenticated(Session),
    /// No credential, or the credential was rejected.
    Unauthenticated,
}

impl SessionState {
    /// Whether the session is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The resolved identity, if authenticated.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(session) => Some(&session.identity),
            _ => None,
        }
    }
}

/// A published view of the session: the state plus the generation counter
/// that stamped it.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Monotonic counter, bumped on every state transition.
    pub generation: u64,
    pub state: SessionState,
}

// =============================================================================
// SessionManager
// =============================================================================

/// Owner of the client's session state.
///
/// Cheaply cloneable; all clones share one state machine. Construct exactly
/// one per running client and hand clones to dependents.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    api: ApiClient,
    store: CredentialStore,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    /// Create a session manager starting in [`SessionState::Resolving`].
    ///
    /// Call [`resolve`](Self::resolve) next to leave the resolving phase.
    #[must_use]
    pub fn new(api: ApiClient, store: CredentialStore) -> Self {
        let state = watch::Sender::new(SessionSnapshot {
            generation: 0,
            state: SessionState::Resolving,
        });

        Self {
            inner: Arc::new(SessionManagerInner { api, store, state }),
        }
    }

    /// The current snapshot (state + generation).
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().state.clone()
    }

    /// The current generation counter.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.state.borrow().generation
    }

    /// Subscribe to session transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Publish a new state, bumping the generation.
    fn publish(&self, state: SessionState) {
        self.inner.state.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.state = state;
        });
    }

    // =========================================================================
    // Lifecycle Operations
    // =========================================================================

    /// Resolve the stored credential to an identity.
    ///
    /// With no stored credential this transitions straight to
    /// `Unauthenticated` without touching the network. With one, it issues a
    /// single identity-resolution request; on any failure (expired token,
    /// network down) the credential is cleared and the session becomes
    /// `Unauthenticated` - resolution failure is a state transition, never an
    /// error.
    #[instrument(skip(self))]
    pub async fn resolve(&self) {
        let Some(token) = self.inner.store.get() else {
            self.publish(SessionState::Unauthenticated);
            return;
        };

        let issued = self.generation();
        let result = self.inner.api.current_user(&token).await;

        // A login/logout may have landed while we were suspended; its state
        // wins over this resolution.
        if self.generation() != issued {
            debug!("Discarding stale identity resolution");
            return;
        }

        match result {
            Ok(identity) => {
                debug!(user_id = %identity.id, "Session resolved");
                self.publish(SessionState::Authenticated(Session { identity, token }));
            }
            Err(e) => {
                warn!(error = %e, "Identity resolution failed, clearing credential");
                self.inner.store.clear();
                self.publish(SessionState::Unauthenticated);
            }
        }
    }

    /// Authenticate with username and password.
    ///
    /// On success the returned credential is persisted and the session
    /// transitions to `Authenticated` atomically. On failure the session is
    /// left exactly as it was. No retries.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidCredentials` when the server rejects the
    /// pair, or `SessionError::Api` for any other failure.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, SessionError> {
        let response = self
            .inner
            .api
            .login(username, password)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized(_) => SessionError::InvalidCredentials,
                other => SessionError::Api(other),
            })?;

        let token = AccessToken::new(response.access_token);
        self.inner.store.set(&token);

        debug!(user_id = %response.user.id, "Login succeeded");
        self.publish(SessionState::Authenticated(Session {
            identity: response.user.clone(),
            token,
        }));

        Ok(response.user)
    }

    /// Create a new account.
    ///
    /// Never authenticates: registration and login are two explicit steps,
    /// and callers are expected to call [`login`](Self::login) afterwards.
    ///
    /// # Errors
    ///
    /// Surfaces the API failure verbatim.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &Email,
        password: &str,
    ) -> Result<(), SessionError> {
        self.inner.api.register(username, email, password).await?;
        Ok(())
    }

    /// End the session.
    ///
    /// Synchronous and local-only: clears the stored credential and publishes
    /// `Unauthenticated`. Never calls the network; cannot fail.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        self.inner.store.clear();
        self.publish(SessionState::Unauthenticated);
        debug!("Logged out");
    }

    /// Change the authenticated user's role.
    ///
    /// On success the stored identity is replaced with the server's response.
    /// The credential did not change, so the generation is left alone and no
    /// cart resynchronization is triggered. On failure the session is left
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAuthenticated` without a network call when
    /// there is no session, or `SessionError::Api` when the request fails.
    #[instrument(skip(self), fields(role = %role))]
    pub async fn update_role(&self, role: Role) -> Result<Identity, SessionError> {
        let snapshot = self.snapshot();
        let SessionState::Authenticated(session) = &snapshot.state else {
            return Err(SessionError::NotAuthenticated);
        };

        let identity = self.inner.api.update_role(&session.token, role).await?;

        // Replace the identity in place, but only if the session this call
        // was issued under is still the current one.
        self.inner.state.send_if_modified(|current| {
            if current.generation == snapshot.generation
                && let SessionState::Authenticated(session) = &mut current.state
            {
                session.identity = identity.clone();
                return true;
            }
            false
        });

        Ok(identity)
    }
}
