//! Common types, the stored-record envelope, and errors shared across `secure-storage` crates.

pub mod error;
pub mod protocol;

pub use error::{BackendError, StoreError};
pub use protocol::{BackendKind, StorageEntry, StoredRecord};
