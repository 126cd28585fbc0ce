//! [`MemoryStorage`]: in-process backend with insertion-ordered keys.

use common::BackendError;

use super::StorageBackend;

/// Insertion-ordered in-memory key-value storage.
///
/// Replacing a key keeps its original position; removing a key shifts the
/// ones after it down by one, as browsers do.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Vec<(String, String)>,
}

impl MemoryStorage {
    /// Create a new, empty [`MemoryStorage`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed storage with existing pairs, keeping their order.
    ///
    /// Later duplicates replace earlier values in place.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut storage = Self::new();
        for (k, v) in entries {
            storage.insert(k.into(), v.into());
        }
        storage
    }

    /// Borrow the pairs in enumeration order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub(crate) fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub(crate) fn delete(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        before != self.entries.len()
    }

    pub(crate) fn lookup(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.lookup(key).map(str::to_owned))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        self.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), BackendError> {
        self.delete(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), BackendError> {
        self.entries.clear();
        Ok(())
    }

    fn key(&self, index: usize) -> Result<Option<String>, BackendError> {
        Ok(self.entries.get(index).map(|(k, _)| k.clone()))
    }

    fn length(&self) -> Result<usize, BackendError> {
        Ok(self.entries.len())
    }
}
