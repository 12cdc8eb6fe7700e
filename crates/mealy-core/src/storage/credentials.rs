//! API token lookup: `MEALY_TOKEN` first, then the OS keyring.

use crate::error::ConfigError;

pub const TOKEN_ENV: &str = "MEALY_TOKEN";
const TOKEN_KEY: &str = "api_token";

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    use crate::error::ConfigError;

    const SERVICE: &str = "mealy";

    fn entry(key: &str) -> Result<keyring::Entry, ConfigError> {
        keyring::Entry::new(SERVICE, key).map_err(|e| ConfigError::Credentials(e.to_string()))
    }

    pub fn get(key: &str) -> Result<Option<String>, ConfigError> {
        match entry(key)?.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ConfigError::Credentials(e.to_string())),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), ConfigError> {
        entry(key)?
            .set_password(value)
            .map_err(|e| ConfigError::Credentials(e.to_string()))
    }

    pub fn delete(key: &str) -> Result<(), ConfigError> {
        match entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ConfigError::Credentials(e.to_string())),
        }
    }
}

/// Where the active token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Env,
    Keyring,
}

/// Resolve the bearer token. A keyring failure is treated as "no token"
/// when the environment variable is absent.
pub fn resolve_token() -> Option<(String, TokenSource)> {
    if let Some(token) = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
        return Some((token, TokenSource::Env));
    }
    match keyring_store::get(TOKEN_KEY) {
        Ok(Some(token)) => Some((token, TokenSource::Keyring)),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("keyring lookup failed: {e}");
            None
        }
    }
}

pub fn store_token(token: &str) -> Result<(), ConfigError> {
    if token.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key: TOKEN_KEY.into(),
            message: "token is empty".into(),
        });
    }
    keyring_store::set(TOKEN_KEY, token.trim())
}

pub fn clear_token() -> Result<(), ConfigError> {
    keyring_store::delete(TOKEN_KEY)
}
