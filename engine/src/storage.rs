//! Key-value storage seam.
//!
//! The engine never touches files or the network itself. Persistence goes
//! through [`KeyValueStorage`], which hosts implement for whatever medium they
//! have. [`MemoryStorage`] is the in-process implementation, used for
//! session-scoped state and in tests.

use crate::error::Result;
use std::collections::BTreeMap;

/// Key holding the full quote list as JSON.
pub const QUOTES_KEY: &str = "quotes";

/// Key holding the last selected category.
pub const LAST_CATEGORY_KEY: &str = "lastCategory";

/// Session key holding the last displayed quote as JSON.
pub const LAST_QUOTE_KEY: &str = "lastQuote";

/// String key-value storage.
pub trait KeyValueStorage {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: String) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Storage that lives only as long as the value itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_set_get_remove() {
        let mut storage = MemoryStorage::new();
        assert!(storage.is_empty());
        assert_eq!(storage.get(QUOTES_KEY), None);

        storage.set(QUOTES_KEY, "[]".into()).unwrap();
        storage.set(QUOTES_KEY, "[1]".into()).unwrap();
        assert_eq!(storage.get(QUOTES_KEY).as_deref(), Some("[1]"));
        assert_eq!(storage.len(), 1);

        storage.remove(QUOTES_KEY).unwrap();
        storage.remove(QUOTES_KEY).unwrap();
        assert_eq!(storage.get(QUOTES_KEY), None);
    }

    #[test]
    fn boxed_storage_delegates() {
        let mut storage: Box<dyn KeyValueStorage> = Box::new(MemoryStorage::new());
        storage.set(LAST_CATEGORY_KEY, "Life".into()).unwrap();
        assert_eq!(storage.get(LAST_CATEGORY_KEY).as_deref(), Some("Life"));
    }
}
