//! Web Storage style key-value backends.
//!
//! [`StorageBackend`] mirrors the native `Storage` interface: string keys,
//! string values, positional key lookup and a length. The store owns two
//! instances, one per [`BackendKind`](common::BackendKind).
//!
//! # Implementations
//!
//! - [`MemoryStorage`]: insertion-ordered, lives as long as the process.
//! - [`FileStorage`]: insertion-ordered, mirrored to a JSON file.
//! - `BrowserStorage` (feature `web`, `wasm32` only): `window.localStorage` /
//!   `window.sessionStorage`.

pub mod file;
pub mod memory;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod browser;

pub use file::FileStorage;
pub use memory::MemoryStorage;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use browser::BrowserStorage;

use common::BackendError;

/// Synchronous string key-value storage.
///
/// Enumeration order (`key(i)` for `i in 0..length()`) is defined by the
/// implementation and must be stable between mutations.
#[cfg_attr(test, mockall::automock)]
pub trait StorageBackend {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), BackendError>;

    /// Remove every key.
    fn clear(&mut self) -> Result<(), BackendError>;

    /// Key at position `index`, or `None` past the end.
    fn key(&self, index: usize) -> Result<Option<String>, BackendError>;

    /// Number of stored keys.
    fn length(&self) -> Result<usize, BackendError>;
}

/// Returns `true` if Web Storage is available in this environment.
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub fn is_storage_supported() -> bool {
    browser::is_supported()
}

/// Returns `true` if Web Storage is available in this environment.
///
/// Native builds always have the in-process and file backends.
#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
pub fn is_storage_supported() -> bool {
    true
}
