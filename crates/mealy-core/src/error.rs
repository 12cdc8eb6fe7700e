//! Core error types for mealy-core.
//!
//! Remote failures are split so the poller can tell a transient network
//! problem (retry next tick) from a malformed payload (skip this cycle).
//! User-initiated actions surface their errors to the caller only.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for mealy-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Remote status store errors
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Local persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A user action that the current member state does not allow
    #[error("Action rejected: {0}")]
    Action(#[from] ActionError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// True when retrying on the next tick may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Remote(e) if e.is_transient())
    }
}

/// Errors talking to the remote status store.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Connection, timeout or body read failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// 401/403 from the store
    #[error("Not authorized for {endpoint}")]
    Unauthorized { endpoint: String },

    /// Payload failed shape validation
    #[error("Malformed snapshot: {0}")]
    Malformed(String),

    /// Store rejected the request (offline store, unknown acting member)
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl RemoteError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Network(_) | RemoteError::Http { .. })
    }
}

impl From<ValidationError> for RemoteError {
    fn from(err: ValidationError) -> Self {
        RemoteError::Malformed(err.to_string())
    }
}

/// Local persistence errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// Mutex around the store was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,

    /// Persisted value could not be parsed
    #[error("Corrupt value for '{key}': {value}")]
    CorruptValue { key: String, value: String },

    /// Could not resolve the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Credential store failure
    #[error("Credential store error: {0}")]
    Credentials(String),
}

/// Actions refused before anything is sent to the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("member is away")]
    MemberAway,

    #[error("member has already eaten this period")]
    AlreadyEaten,

    #[error("food has already been reported finished")]
    OverrideActive,
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Hour outside 0..=23
    #[error("Hour out of range: {0} (expected 0-23)")]
    HourOutOfRange(u32),

    /// Time string not in HH:MM form
    #[error("Invalid time '{0}' (expected HH:MM)")]
    InvalidTime(String),

    /// Required field missing or empty
    #[error("Missing field '{field}' in {entity}")]
    MissingField { entity: String, field: String },

    /// The same member id appears twice in a snapshot
    #[error("Duplicate member id: {0}")]
    DuplicateMember(String),
}

/// Result type alias for CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
