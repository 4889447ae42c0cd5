//! Key-value persistence port.
//!
//! The cart, bearer token and user profile are each stored as one string
//! value under a fixed key. Anything that can get, put and delete strings can
//! back them: [`MemoryStorage`] here, a directory of files in the client crate.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Fixed storage keys.
pub mod keys {
    /// Serialized cart line list.
    pub const CART: &str = "vitrine.cart";
    /// Bearer token returned by access verification or login.
    pub const TOKEN: &str = "vitrine.token";
    /// Serialized user profile.
    pub const USER: &str = "vitrine.user";
}

/// Errors raised by a [`Storage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error for {key}: {source}")]
    Io {
        /// Key being accessed.
        key: String,
        /// Cause.
        #[source]
        source: std::io::Error,
    },

    /// A value could not be encoded.
    #[error("failed to encode {key}: {source}")]
    Encode {
        /// Key being written.
        key: String,
        /// Cause.
        #[source]
        source: serde_json::Error,
    },

    /// The key is not a valid storage name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// The backend is unusable (e.g. a poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A string key-value store.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read. A missing key is
    /// `Ok(None)`, not an error.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<T>(_: PoisonError<T>) -> StorageError {
        StorageError::Unavailable("memory storage lock poisoned".to_string())
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().map_err(Self::poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().map_err(Self::poisoned)?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().map_err(Self::poisoned)?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load(keys::CART).unwrap(), None);

        storage.save(keys::CART, "[]").unwrap();
        assert_eq!(storage.load(keys::CART).unwrap().as_deref(), Some("[]"));

        storage.remove(keys::CART).unwrap();
        assert_eq!(storage.load(keys::CART).unwrap(), None);

        // Removing twice is fine
        storage.remove(keys::CART).unwrap();
    }
}
