//! Durable key-value storage for the session store.
//!
//! The browser host keeps these entries in `localStorage`, the terminal client
//! in a small JSON file, and tests in memory.

#[cfg(feature = "native")]
pub mod file_storage;

use std::cell::RefCell;
use std::collections::HashMap;

use crate::errors::ClientError;

#[cfg(feature = "native")]
pub use file_storage::FileStorage;

/// String entries that survive a process restart.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// In-process storage. Durable only for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { entries: RefCell::new(map) }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
