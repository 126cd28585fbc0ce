//! Per-call overrides and their merge with the store configuration.

use common::BackendKind;

use crate::config::StoreConfig;

/// Overrides accepted by [`SecureStorage::set`](super::SecureStorage::set).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetOptions {
    /// Target backend.
    pub backend: Option<BackendKind>,
    /// Key prefix; `Some("")` disables prefixing for this call.
    pub prefix: Option<String>,
    /// Expiry in seconds; `0` never expires.
    pub expire: Option<f64>,
}

impl SetOptions {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn expire(mut self, secs: f64) -> Self {
        self.expire = Some(secs);
        self
    }
}

/// Overrides accepted by reads and removals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyOptions {
    /// Target backend.
    pub backend: Option<BackendKind>,
    /// Key prefix; `Some("")` disables prefixing for this call.
    pub prefix: Option<String>,
}

impl KeyOptions {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Options with every field filled in from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolved<'a> {
    pub backend: BackendKind,
    pub prefix: &'a str,
    pub expire_secs: f64,
}

impl StoreConfig {
    pub(crate) fn resolve<'a>(&'a self, opts: &'a SetOptions) -> Resolved<'a> {
        Resolved {
            backend: opts.backend.unwrap_or(self.backend),
            prefix: opts.prefix.as_deref().unwrap_or(&self.prefix),
            expire_secs: opts.expire.unwrap_or(self.expire_secs),
        }
    }

    pub(crate) fn resolve_key<'a>(&'a self, opts: &'a KeyOptions) -> (BackendKind, &'a str) {
        (
            opts.backend.unwrap_or(self.backend),
            opts.prefix.as_deref().unwrap_or(&self.prefix),
        )
    }
}
