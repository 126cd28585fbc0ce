//! Configuration loading and validation for the storage CLI.
//!
//! Values are read from environment variables at startup. The process exits
//! with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use secure_storage::{
    crypto::{DEFAULT_SECRET_IV, DEFAULT_SECRET_KEY},
    ExpiryPolicy, StoreConfig,
};
use serde::Deserialize;

/// Validated CLI configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Path of the JSON file backing persistent storage. **Required.**
    pub storage_path: String,

    /// Default key prefix; empty disables prefixing.
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,

    /// Default expiry in seconds for writes.
    #[serde(default = "default_storage_expire_secs")]
    pub storage_expire_secs: f64,

    /// Whether envelopes are encrypted.
    #[serde(default = "default_storage_encrypt")]
    pub storage_encrypt: bool,

    /// `legacy` or `per_record`.
    #[serde(default)]
    pub storage_expiry_policy: ExpiryPolicy,

    /// Cipher key (UTF-8, 16/24/32 bytes).
    #[serde(default = "default_storage_secret_key")]
    pub storage_secret_key: String,

    /// Cipher IV (UTF-8, 16 bytes).
    #[serde(default = "default_storage_secret_iv")]
    pub storage_secret_iv: String,

    /// Tracing log level (e.g. `"warn"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_storage_prefix() -> String {
    "ENCRYPTED".into()
}
fn default_storage_expire_secs() -> f64 {
    604_800.0
}
fn default_storage_encrypt() -> bool {
    true
}
fn default_storage_secret_key() -> String {
    DEFAULT_SECRET_KEY.into()
}
fn default_storage_secret_iv() -> String {
    DEFAULT_SECRET_IV.into()
}
fn default_log_level() -> String {
    "warn".into()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("storage_path", &self.storage_path)
            .field("storage_prefix", &self.storage_prefix)
            .field("storage_expire_secs", &self.storage_expire_secs)
            .field("storage_encrypt", &self.storage_encrypt)
            .field("storage_expiry_policy", &self.storage_expiry_policy)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build storage CLI configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise storage CLI configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The library configuration described by these settings.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_prefix(self.storage_prefix.clone())
            .with_expire_secs(self.storage_expire_secs)
            .with_encrypt(self.storage_encrypt)
            .with_expiry_policy(self.storage_expiry_policy)
            .with_secret(
                self.storage_secret_key.clone(),
                self.storage_secret_iv.clone(),
            )
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.storage_path.trim().is_empty() {
            anyhow::bail!("STORAGE_PATH is required and must not be empty");
        }
        if !self.storage_expire_secs.is_finite() || self.storage_expire_secs < 0.0 {
            anyhow::bail!("STORAGE_EXPIRE_SECS must be a non-negative number");
        }
        self.store_config()
            .validate()
            .context("STORAGE_SECRET_KEY / STORAGE_SECRET_IV are invalid")?;
        Ok(())
    }
}
