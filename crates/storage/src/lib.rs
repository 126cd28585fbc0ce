//! # secure-storage
//!
//! Encrypting, expiring, prefix-namespaced key-value storage over Web Storage
//! style backends (`localStorage` / `sessionStorage` in a browser, memory or a
//! JSON file elsewhere).
//!
//! Every value is wrapped in a [`StoredRecord`] envelope carrying its write
//! time and expiry, optionally AES-CBC encrypted, and written under
//! `prefix_key`. Reads hide and delete expired records and slide the expiry of
//! live ones forward.
//!
//! ```rust
//! use secure_storage::{KeyOptions, MemoryStorage, SecureStorage, SetOptions, StoreConfig};
//! use serde_json::json;
//!
//! let mut store = SecureStorage::new(
//!     StoreConfig::default(),
//!     Box::new(MemoryStorage::new()),
//!     Box::new(MemoryStorage::new()),
//! )?;
//! store.set("token", json!({"id": 42}), &SetOptions::new().expire(60.0))?;
//! assert_eq!(store.get("token", &KeyOptions::new())?, Some(json!({"id": 42})));
//! # Ok::<(), secure_storage::StoreError>(())
//! ```
//!
//! ## Modules
//!
//! - **crypto**: AES-CBC cipher adapter with a fixed, injectable key and IV
//! - **backend**: the [`StorageBackend`] trait and its implementations
//! - **store**: [`SecureStorage`] and its per-call options
//! - **config**: [`StoreConfig`] and the expiry policy
//! - **clock**: time sources

pub mod backend;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod store;

pub use backend::{is_storage_supported, FileStorage, MemoryStorage, StorageBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use common::{BackendError, BackendKind, StorageEntry, StoreError, StoredRecord};
pub use config::{ExpiryPolicy, StoreConfig};
pub use crypto::Cipher;
pub use store::{KeyOptions, SecureStorage, SetOptions};

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use backend::BrowserStorage;
