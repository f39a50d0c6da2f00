//! Bearer credential type.

use secrecy::{ExposeSecret, SecretString};

/// An opaque bearer token authorizing marketplace API calls.
///
/// The token is created on successful login and destroyed on logout or when
/// the server rejects it; it is never mutated in place. The inner value is
/// wrapped in [`SecretString`] so accidental `Debug` output cannot leak it.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Create a token from its raw string form.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Expose the raw token for use in an `Authorization` header or for
    /// persisting to the credential store.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}
