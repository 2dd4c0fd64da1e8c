use std::cell::RefCell;
use std::rc::Rc;

use tracing::{info, warn};

use crate::errors::ClientError;
use crate::models::Session;
use crate::storage::SessionStorage;

pub const TOKEN_KEY: &str = "sessionId";
pub const USERNAME_KEY: &str = "username";

/// Single source of truth for "is the user authenticated" and "who are they".
///
/// Token and username are always present together or absent together, both in
/// memory and in durable storage.
pub struct SessionStore {
    storage: Rc<dyn SessionStorage>,
    current: RefCell<Option<Session>>,
}

impl SessionStore {
    /// Restores the session persisted by a previous run, if complete.
    pub fn load(storage: Rc<dyn SessionStorage>) -> Self {
        let token = storage.get(TOKEN_KEY).filter(|t| !t.is_empty());
        let username = storage.get(USERNAME_KEY);

        let current = match (token, username) {
            (Some(token), Some(username)) => Some(Session { token, username }),
            (None, None) => None,
            _ => {
                warn!("Discarding incomplete persisted session");
                for key in [TOKEN_KEY, USERNAME_KEY] {
                    if let Err(e) = storage.remove(key) {
                        warn!("Failed to remove '{key}': {e}");
                    }
                }
                None
            }
        };

        Self { storage, current: RefCell::new(current) }
    }

    pub fn set_session(&self, token: &str, username: &str) -> Result<(), ClientError> {
        self.storage.set(TOKEN_KEY, token)?;
        if let Err(e) = self.storage.set(USERNAME_KEY, username) {
            if let Err(rollback) = self.storage.remove(TOKEN_KEY) {
                warn!("Failed to roll back session token: {rollback}");
            }
            return Err(e);
        }

        *self.current.borrow_mut() = Some(Session {
            token: token.to_string(),
            username: username.to_string(),
        });
        info!("Session established for {username}");
        Ok(())
    }

    /// Forgets the session. Safe to call any number of times.
    pub fn clear_session(&self) {
        for key in [TOKEN_KEY, USERNAME_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to remove '{key}': {e}");
            }
        }
        if self.current.borrow_mut().take().is_some() {
            info!("Session cleared");
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.token.clone())
    }

    pub fn username(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.username.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    /// Accepts the token write and rejects everything else.
    struct FailingUsernameStorage {
        inner: MemoryStorage,
    }

    impl SessionStorage for FailingUsernameStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
            if key == USERNAME_KEY {
                return Err(ClientError::Storage("disk full".into()));
            }
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), ClientError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn set_session_writes_memory_and_storage() {
        let storage = Rc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone());
        assert!(!store.is_authenticated());

        store.set_session("tok-1", "ana").unwrap();

        assert!(store.is_authenticated());
        assert_eq!(store.token().as_deref(), Some("tok-1"));
        assert_eq!(store.username().as_deref(), Some("ana"));
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok-1"));
        assert_eq!(storage.get(USERNAME_KEY).as_deref(), Some("ana"));
    }

    #[test]
    fn clear_session_is_idempotent() {
        let storage = Rc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone());
        store.set_session("tok-1", "ana").unwrap();

        store.clear_session();
        store.clear_session();

        assert!(!store.is_authenticated());
        assert_eq!(store.token(), None);
        assert_eq!(store.username(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn load_restores_complete_session() {
        let storage = Rc::new(MemoryStorage::with_entries([(TOKEN_KEY, "tok"), (USERNAME_KEY, "bo")]));
        let store = SessionStore::load(storage);
        assert_eq!(
            store.session(),
            Some(Session { token: "tok".into(), username: "bo".into() })
        );
    }

    #[test]
    fn load_discards_partial_session() {
        let storage = Rc::new(MemoryStorage::with_entries([(TOKEN_KEY, "tok")]));
        let store = SessionStore::load(storage.clone());
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn failed_username_write_rolls_back_token() {
        let storage = Rc::new(FailingUsernameStorage { inner: MemoryStorage::new() });
        let store = SessionStore::load(storage.clone());

        let err = store.set_session("tok", "ana").unwrap_err();

        assert!(matches!(err, ClientError::Storage(_)));
        assert!(!store.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY), None);
    }
}
