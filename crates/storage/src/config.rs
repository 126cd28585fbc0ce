//! Store configuration.
//!
//! A [`StoreConfig`] is owned by the store and never mutated by individual
//! calls; per-call options are merged over it functionally.

use common::{BackendKind, StoreError};
use serde::Deserialize;

use crate::crypto::{Cipher, DEFAULT_SECRET_IV, DEFAULT_SECRET_KEY};

/// Milliseconds of age allowed per configured expiry second under
/// [`ExpiryPolicy::Legacy`].
pub const LEGACY_EXPIRY_MULTIPLIER: f64 = 6000.0;

/// How the read path decides whether a record is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Compare the record's age against the configured default expiry scaled
    /// by [`LEGACY_EXPIRY_MULTIPLIER`], ignoring the record's own `expire`.
    /// Matches records written and read by existing clients.
    #[default]
    Legacy,
    /// Compare the record's age against the record's own `expire`.
    PerRecord,
}

/// Configuration for a [`SecureStorage`](crate::store::SecureStorage).
///
/// # Example
///
/// ```rust
/// use secure_storage::config::{ExpiryPolicy, StoreConfig};
///
/// let config = StoreConfig::default()
///     .with_prefix("APP")
///     .with_expire_secs(3600.0)
///     .with_expiry_policy(ExpiryPolicy::PerRecord);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend used when a call does not name one.
    #[serde(default)]
    pub backend: BackendKind,

    /// Key prefix used when a call does not name one. Empty disables prefixing.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Expiry in seconds used when a write does not name one. `0` never expires.
    #[serde(default = "default_expire_secs")]
    pub expire_secs: f64,

    /// Whether envelopes are encrypted before being written.
    #[serde(default = "default_encrypt")]
    pub encrypt: bool,

    /// Staleness rule applied on read.
    #[serde(default)]
    pub expiry_policy: ExpiryPolicy,

    /// Cipher key; its UTF-8 bytes are used directly (16, 24 or 32 bytes).
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// Cipher IV; its UTF-8 bytes are used directly (16 bytes).
    #[serde(default = "default_secret_iv")]
    pub secret_iv: String,
}

fn default_prefix() -> String {
    "ENCRYPTED".into()
}
fn default_expire_secs() -> f64 {
    7.0 * 24.0 * 60.0 * 60.0
}
fn default_encrypt() -> bool {
    true
}
fn default_secret_key() -> String {
    DEFAULT_SECRET_KEY.into()
}
fn default_secret_iv() -> String {
    DEFAULT_SECRET_IV.into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            prefix: default_prefix(),
            expire_secs: default_expire_secs(),
            encrypt: default_encrypt(),
            expiry_policy: ExpiryPolicy::default(),
            secret_key: default_secret_key(),
            secret_iv: default_secret_iv(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("prefix", &self.prefix)
            .field("expire_secs", &self.expire_secs)
            .field("encrypt", &self.encrypt)
            .field("expiry_policy", &self.expiry_policy)
            .field("secret_key", &"[REDACTED]")
            .field("secret_iv", &"[REDACTED]")
            .finish()
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default backend.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the default key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the default expiry in seconds.
    pub fn with_expire_secs(mut self, expire_secs: f64) -> Self {
        self.expire_secs = expire_secs;
        self
    }

    /// Enables or disables envelope encryption.
    pub fn with_encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Sets the staleness rule.
    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }

    /// Sets the cipher key and IV.
    pub fn with_secret(mut self, key: impl Into<String>, iv: impl Into<String>) -> Self {
        self.secret_key = key.into();
        self.secret_iv = iv.into();
        self
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the default expiry is not a
    /// non-negative finite number or the key/IV have unusable lengths.
    pub fn validate(&self) -> Result<(), StoreError> {
        if !self.expire_secs.is_finite()
            || self.expire_secs < 0.0
            || self.expire_secs * 1000.0 >= u64::MAX as f64
        {
            return Err(StoreError::InvalidConfig(format!(
                "expire_secs must be a non-negative number of seconds within range, got {}",
                self.expire_secs
            )));
        }
        self.cipher().map(|_| ())
    }

    /// Build the cipher described by `secret_key` / `secret_iv`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the key or IV length is invalid.
    pub fn cipher(&self) -> Result<Cipher, StoreError> {
        Cipher::new(self.secret_key.as_bytes(), self.secret_iv.as_bytes())
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))
    }

    /// Age in milliseconds beyond which any expiring record is stale under
    /// [`ExpiryPolicy::Legacy`].
    pub fn legacy_threshold_millis(&self) -> f64 {
        self.expire_secs * LEGACY_EXPIRY_MULTIPLIER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.backend, BackendKind::Local);
        assert_eq!(cfg.prefix, "ENCRYPTED");
        assert_eq!(cfg.expire_secs, 604_800.0);
        assert!(cfg.encrypt);
        assert_eq!(cfg.expiry_policy, ExpiryPolicy::Legacy);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_pattern_chaining() {
        let cfg = StoreConfig::new()
            .with_backend(BackendKind::Session)
            .with_prefix("")
            .with_expire_secs(10.0)
            .with_encrypt(false)
            .with_expiry_policy(ExpiryPolicy::PerRecord);
        assert_eq!(cfg.backend, BackendKind::Session);
        assert!(cfg.prefix.is_empty());
        assert_eq!(cfg.expire_secs, 10.0);
        assert!(!cfg.encrypt);
        assert_eq!(cfg.expiry_policy, ExpiryPolicy::PerRecord);
    }

    #[test]
    fn legacy_threshold_scales_default_expiry() {
        let cfg = StoreConfig::default().with_expire_secs(10.0);
        assert_eq!(cfg.legacy_threshold_millis(), 60_000.0);
    }

    #[test]
    fn validate_rejects_negative_expiry() {
        let cfg = StoreConfig::default().with_expire_secs(-1.0);
        assert!(matches!(cfg.validate(), Err(StoreError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_nan_expiry() {
        let cfg = StoreConfig::default().with_expire_secs(f64::NAN);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_expiry() {
        let cfg = StoreConfig::default().with_expire_secs(1e300);
        assert!(matches!(cfg.validate(), Err(StoreError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_short_key() {
        let cfg = StoreConfig::default().with_secret("short", DEFAULT_SECRET_IV);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn secrets_redacted_in_debug() {
        let text = format!("{:?}", StoreConfig::default());
        assert!(!text.contains(DEFAULT_SECRET_KEY));
        assert!(text.contains("REDACTED"));
    }

    #[test]
    fn deserialises_with_defaults() {
        let cfg: StoreConfig =
            serde_json::from_str(r#"{"backend":"session","expiry_policy":"per_record"}"#).unwrap();
        assert_eq!(cfg.backend, BackendKind::Session);
        assert_eq!(cfg.expiry_policy, ExpiryPolicy::PerRecord);
        assert_eq!(cfg.prefix, "ENCRYPTED");
    }
}
