//! Common error types shared across crates.

use thiserror::Error;

use crate::protocol::BackendKind;

/// Top-level store error type.
///
/// Expired or missing records are not errors; reads report them as `None`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The expiry passed to a write is negative or not a finite number.
    /// Raised before the backend is touched.
    #[error("invalid expire: {0}")]
    InvalidExpire(String),

    /// The store configuration is unusable (bad key, IV or default expiry).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested storage facility does not exist in this environment.
    #[error("{0} is not supported in this environment")]
    Unsupported(BackendKind),

    /// A stored envelope could not be decrypted or parsed.
    #[error("corrupt record under key {key}")]
    CorruptRecord {
        /// The prefixed key holding the unreadable value.
        key: String,
    },

    /// A caller payload could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The underlying backend rejected an operation.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StoreError {
    /// Returns `true` for errors caused by caller-supplied configuration,
    /// as opposed to stored data or the backend.
    pub fn is_config_error(&self) -> bool {
        matches!(self, StoreError::InvalidExpire(_) | StoreError::InvalidConfig(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Errors produced by a storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend cannot be reached (e.g. storage disabled by the browser).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backing file failed.
    #[error("storage i/o error: {0}")]
    Io(String),

    /// The backend refused the operation (quota, security policy, ...).
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}
