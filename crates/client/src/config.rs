//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_API_URL` - Base URL of the marketplace API (e.g., `https://api.bazaar.example`)
//!
//! ## Optional
//! - `BAZAAR_CREDENTIAL_FILE` - Path of the durable credential slot
//!   (default: `<user data dir>/bazaar/credential`)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the marketplace API.
    pub api_url: Url,
    /// Path of the durable credential slot.
    pub credential_file: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `BAZAAR_API_URL` is missing or is not a
    /// valid absolute URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_required_env("BAZAAR_API_URL")?)?;
        let credential_file = std::env::var("BAZAAR_CREDENTIAL_FILE")
            .map_or_else(|_| default_credential_file(), PathBuf::from);

        Ok(Self {
            api_url,
            credential_file,
        })
    }
}

/// Parse and validate the API base URL.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_API_URL".to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "BAZAAR_API_URL".to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }

    Ok(url)
}

/// Default location of the credential slot: `<user data dir>/bazaar/credential`.
///
/// Falls back to the system temp dir when no user data dir can be determined
/// (e.g., stripped-down containers).
fn default_credential_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("bazaar")
        .join("credential")
}

fn get_required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_accepts_http_and_https() {
        assert!(parse_api_url("http://localhost:8080").is_ok());
        assert!(parse_api_url("https://api.bazaar.example").is_ok());
    }

    #[test]
    fn test_parse_api_url_rejects_relative() {
        assert!(matches!(
            parse_api_url("api.bazaar.example/v1"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_parse_api_url_rejects_non_http_scheme() {
        assert!(matches!(
            parse_api_url("ftp://api.bazaar.example"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_default_credential_file_ends_with_slot_name() {
        let path = default_credential_file();
        assert!(path.ends_with("bazaar/credential"));
    }
}
