//! Environment configuration for the Immich server connection.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory. Missing values are not rejected here: an
//! empty base URL or key surfaces later as a failed request.

use std::path::PathBuf;

use tracing::debug;

/// Environment variable holding the server base URL.
pub const BASE_URL_VAR: &str = "ImmichURL";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "ImmichKey";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The `.env` file exists but could not be read or parsed.
    #[error("error loading .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}

/// Connection settings for the Immich API.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
}

// Keep the key out of debug logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ApiConfig {
    /// Reads the settings from the current environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the settings through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            base_url: lookup(BASE_URL_VAR).unwrap_or_default(),
            api_key: lookup(API_KEY_VAR).unwrap_or_default(),
        }
    }
}

/// Loads `.env` from the working directory (or a parent) into the environment.
///
/// Returns the path of the loaded file, or `None` when there is no `.env` file.
///
/// # Errors
///
/// Returns [`ConfigError::DotEnv`] if a `.env` file exists but is malformed.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "loaded .env file");
            Ok(Some(path))
        }
        Err(error) if error.not_found() => {
            debug!("no .env file found");
            Ok(None)
        }
        Err(error) => Err(ConfigError::DotEnv(error)),
    }
}
