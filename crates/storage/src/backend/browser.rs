//! [`BrowserStorage`]: `window.localStorage` / `window.sessionStorage` via web-sys.

use common::{BackendError, BackendKind, StoreError};
use tracing::warn;

use super::StorageBackend;
use crate::config::StoreConfig;
use crate::store::SecureStorage;

/// Handle to one of the browser's native Web Storage objects.
pub struct BrowserStorage {
    kind: BackendKind,
    storage: web_sys::Storage,
}

impl std::fmt::Debug for BrowserStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserStorage").field("kind", &self.kind).finish()
    }
}

impl BrowserStorage {
    /// Open the native storage object for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unavailable`] when there is no `window`, or the
    /// browser refuses or lacks the storage object (private mode, disabled
    /// cookies, worker context).
    pub fn open(kind: BackendKind) -> Result<Self, BackendError> {
        let window = web_sys::window()
            .ok_or_else(|| BackendError::Unavailable("no window object".into()))?;
        let storage = match kind {
            BackendKind::Local => window.local_storage(),
            BackendKind::Session => window.session_storage(),
        }
        .map_err(|e| BackendError::Unavailable(format!("{kind}: {e:?}")))?
        .ok_or_else(|| BackendError::Unavailable(format!("{kind} is not present")))?;
        Ok(Self { kind, storage })
    }

    /// Open `localStorage`.
    pub fn local() -> Result<Self, BackendError> {
        Self::open(BackendKind::Local)
    }

    /// Open `sessionStorage`.
    pub fn session() -> Result<Self, BackendError> {
        Self::open(BackendKind::Session)
    }

    /// Which native object this handle wraps.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }
}

impl SecureStorage {
    /// Create a store over the browser's `localStorage` and `sessionStorage`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unsupported`] naming the first storage object
    /// that cannot be opened, or [`StoreError::InvalidConfig`] as
    /// [`SecureStorage::new`].
    pub fn browser(config: StoreConfig) -> Result<Self, StoreError> {
        let local = BrowserStorage::local().map_err(|e| {
            warn!(error = %e, "localStorage unavailable");
            StoreError::Unsupported(BackendKind::Local)
        })?;
        let session = BrowserStorage::session().map_err(|e| {
            warn!(error = %e, "sessionStorage unavailable");
            StoreError::Unsupported(BackendKind::Session)
        })?;
        Self::new(config, Box::new(local), Box::new(session))
    }
}

/// Returns `true` if both native storage objects can be opened.
pub fn is_supported() -> bool {
    BrowserStorage::local().is_ok() && BrowserStorage::session().is_ok()
}

fn op_error(op: &str, e: impl std::fmt::Debug) -> BackendError {
    BackendError::Operation(format!("{op}: {e:?}"))
}

impl StorageBackend for BrowserStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.storage
            .get_item(key)
            .map_err(|e| op_error("getItem", e))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| op_error("setItem", e))
    }

    fn remove_item(&mut self, key: &str) -> Result<(), BackendError> {
        self.storage
            .remove_item(key)
            .map_err(|e| op_error("removeItem", e))
    }

    fn clear(&mut self) -> Result<(), BackendError> {
        self.storage.clear().map_err(|e| op_error("clear", e))
    }

    fn key(&self, index: usize) -> Result<Option<String>, BackendError> {
        let index = match u32::try_from(index) {
            Ok(i) => i,
            Err(_) => return Ok(None),
        };
        self.storage.key(index).map_err(|e| op_error("key", e))
    }

    fn length(&self) -> Result<usize, BackendError> {
        self.storage
            .length()
            .map(|n| n as usize)
            .map_err(|e| op_error("length", e))
    }
}
