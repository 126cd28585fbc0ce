//! [`SecureStorage`]: the expiring, prefix-namespaced, encrypting store.
//!
//! # Read path
//!
//! 1. Look up the prefixed key. Missing or empty entries are `None`; nothing
//!    is decrypted.
//! 2. Decrypt (when encryption is enabled) and parse the [`StoredRecord`].
//!    Unreadable entries surface [`StoreError::CorruptRecord`] and are left
//!    in place.
//! 3. Expired records are removed and reported as `None`.
//! 4. Live records are rewritten with a fresh timestamp (sliding expiry)
//!    before their value is returned. Under [`ExpiryPolicy::Legacy`] the
//!    rewrite takes the configured default expiry; under
//!    [`ExpiryPolicy::PerRecord`] the record keeps its own.
//!
//! # Invariants
//!
//! - A write with an invalid expiry fails before the backend is touched.
//! - The two backends are disjoint; no operation reads one and writes the other.
//! - Values, plaintext and key material are never logged.

pub mod key;
pub mod options;

pub use options::{KeyOptions, SetOptions};

use std::sync::Arc;

use common::{BackendKind, StorageEntry, StoreError, StoredRecord};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::StorageBackend;
use crate::clock::{Clock, SystemClock};
use crate::config::{ExpiryPolicy, StoreConfig};
use crate::crypto::Cipher;
use key::add_prefix;

/// Encrypting, expiring key-value store over a persistent and a
/// session-scoped backend.
pub struct SecureStorage {
    config: StoreConfig,
    cipher: Cipher,
    local: Box<dyn StorageBackend>,
    session: Box<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SecureStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureStorage")
            .field("config", &self.config)
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

impl SecureStorage {
    /// Create a store over the given persistent (`local`) and session-scoped
    /// (`session`) backends.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        config: StoreConfig,
        local: Box<dyn StorageBackend>,
        session: Box<dyn StorageBackend>,
    ) -> Result<Self, StoreError> {
        config.validate()?;
        let cipher = config.cipher()?;
        Ok(Self {
            config,
            cipher,
            local,
            session,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Borrow the backend for `kind` directly, bypassing prefixing,
    /// encryption and expiry.
    pub fn backend(&self, kind: BackendKind) -> &dyn StorageBackend {
        match kind {
            BackendKind::Local => self.local.as_ref(),
            BackendKind::Session => self.session.as_ref(),
        }
    }

    fn backend_mut(&mut self, kind: BackendKind) -> &mut dyn StorageBackend {
        match kind {
            BackendKind::Local => self.local.as_mut(),
            BackendKind::Session => self.session.as_mut(),
        }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Store `value` under `key`.
    ///
    /// Empty strings and `null` are stored as `null`. The record is stamped
    /// with the current time and `expire` seconds (default from config).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidExpire`] if the expiry is negative or not
    /// finite; nothing is written in that case.
    /// Returns [`StoreError::Backend`] if the backend rejects the write.
    pub fn set(&mut self, key: &str, value: Value, opts: &SetOptions) -> Result<(), StoreError> {
        let resolved = self.config.resolve(opts);
        let expire = expire_millis(resolved.expire_secs)?;
        let full_key = add_prefix(key, resolved.prefix);
        self.write(resolved.backend, &full_key, normalize(value), expire)
    }

    /// Serialise `value` to JSON and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if `value` cannot be represented
    /// as JSON, otherwise as [`SecureStorage::set`].
    pub fn set_value<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        opts: &SetOptions,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.set(key, value, opts)
    }

    /// Remove `key`. Absent keys are not an error.
    pub fn remove(&mut self, key: &str, opts: &KeyOptions) -> Result<(), StoreError> {
        let (backend, prefix) = self.config.resolve_key(opts);
        let full_key = add_prefix(key, prefix);
        self.backend_mut(backend).remove_item(&full_key)?;
        Ok(())
    }

    /// Remove every key in the backend, including keys this store did not write.
    pub fn clear(&mut self, backend: Option<BackendKind>) -> Result<(), StoreError> {
        let backend = backend.unwrap_or(self.config.backend);
        self.backend_mut(backend).clear()?;
        debug!(%backend, "storage cleared");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is missing, the record has expired
    /// (the entry is removed), or the stored value is `null`. A live record is
    /// rewritten with the current time; see the module docs for its expiry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptRecord`] if the stored text cannot be
    /// decrypted and parsed into a record.
    /// Returns [`StoreError::Backend`] if a backend operation fails.
    pub fn get(&mut self, key: &str, opts: &KeyOptions) -> Result<Option<Value>, StoreError> {
        let (backend, prefix) = self.config.resolve_key(opts);
        let full_key = add_prefix(key, prefix);

        let raw = match self.backend(backend).get_item(&full_key)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };
        let record = self.decode(&full_key, raw)?;

        let now = self.clock.now_millis();
        if self.is_expired(&record, now) {
            debug!(key = %full_key, %backend, age_ms = record.age_at(now), "record expired");
            self.backend_mut(backend).remove_item(&full_key)?;
            return Ok(None);
        }

        let expire = match self.config.expiry_policy {
            ExpiryPolicy::Legacy => expire_millis(self.config.expire_secs)?,
            ExpiryPolicy::PerRecord => record.expire,
        };
        self.write(backend, &full_key, record.value.clone(), expire)?;

        Ok(match record.value {
            Value::Null => None,
            value => Some(value),
        })
    }

    /// Read `key` and deserialise the value into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the stored value does not fit
    /// `T`, otherwise as [`SecureStorage::get`].
    pub fn get_as<T: DeserializeOwned>(
        &mut self,
        key: &str,
        opts: &KeyOptions,
    ) -> Result<Option<T>, StoreError> {
        match self.get(key, opts)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Every key in the backend paired with its raw stored text, in the
    /// backend's enumeration order.
    pub fn list_all(&self, backend: Option<BackendKind>) -> Result<Vec<StorageEntry>, StoreError> {
        let storage = self.backend(backend.unwrap_or(self.config.backend));
        let len = storage.length()?;
        let mut entries = Vec::with_capacity(len);
        for index in 0..len {
            let key = storage.key(index)?;
            let value = storage.get_item(key.as_deref().unwrap_or(""))?;
            entries.push(StorageEntry { key, value });
        }
        Ok(entries)
    }

    /// Returns `true` if the default backend holds `key` under `prefix`.
    ///
    /// `prefix = None` matches the bare key; the configured prefix is not
    /// applied.
    pub fn has(&self, key: &str, prefix: Option<&str>) -> Result<bool, StoreError> {
        let target = add_prefix(key, prefix.unwrap_or(""));
        Ok(self
            .list_all(None)?
            .iter()
            .any(|entry| entry.key.as_deref() == Some(target.as_str())))
    }

    /// All keys in the default backend, prefixes included.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .list_all(None)?
            .into_iter()
            .filter_map(|entry| entry.key)
            .collect())
    }

    /// Key at position `index` in the backend.
    pub fn key_at(
        &self,
        index: usize,
        backend: Option<BackendKind>,
    ) -> Result<Option<String>, StoreError> {
        let backend = backend.unwrap_or(self.config.backend);
        Ok(self.backend(backend).key(index)?)
    }

    /// Number of keys in the backend.
    pub fn length(&self, backend: Option<BackendKind>) -> Result<usize, StoreError> {
        let backend = backend.unwrap_or(self.config.backend);
        Ok(self.backend(backend).length()?)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn write(
        &mut self,
        backend: BackendKind,
        full_key: &str,
        value: Value,
        expire: u64,
    ) -> Result<(), StoreError> {
        let record = StoredRecord::new(value, self.clock.now_millis(), expire);
        let text = serde_json::to_string(&record)?;
        let text = if self.config.encrypt {
            self.cipher.encrypt_text(&text)
        } else {
            text
        };

        self.backend_mut(backend).set_item(full_key, &text)?;
        debug!(key = %full_key, %backend, expire_ms = expire, "record written");
        Ok(())
    }

    fn decode(&self, full_key: &str, raw: String) -> Result<StoredRecord, StoreError> {
        let text = if self.config.encrypt {
            self.cipher.decrypt(Some(&raw))
        } else {
            raw
        };
        serde_json::from_str(&text).map_err(|e| {
            warn!(key = %full_key, error = %e, "stored record is unreadable");
            StoreError::CorruptRecord {
                key: full_key.to_owned(),
            }
        })
    }

    fn is_expired(&self, record: &StoredRecord, now: i64) -> bool {
        if !record.expires() {
            return false;
        }
        let age = record.age_at(now) as f64;
        match self.config.expiry_policy {
            ExpiryPolicy::Legacy => self.config.legacy_threshold_millis() < age,
            ExpiryPolicy::PerRecord => (record.expire as f64) < age,
        }
    }
}

fn normalize(value: Value) -> Value {
    match value {
        Value::String(s) if s.is_empty() => Value::Null,
        other => other,
    }
}

fn expire_millis(secs: f64) -> Result<u64, StoreError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(StoreError::InvalidExpire(format!(
            "expire must be a non-negative number of seconds, got {secs}"
        )));
    }
    // A positive expiry must never collapse to 0, which means "never".
    let millis = (secs * 1000.0).ceil();
    if millis >= u64::MAX as f64 {
        return Err(StoreError::InvalidExpire(format!(
            "expire of {secs} seconds is out of range"
        )));
    }
    Ok(millis as u64)
}
