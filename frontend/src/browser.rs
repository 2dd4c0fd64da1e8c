use persona_chat::navigation::Navigator;
use persona_chat::storage::SessionStorage;
use persona_chat::ClientError;
use web_sys::Storage;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const CHAT_PATH: &str = "/";

/// Session storage on top of `window.localStorage`.
pub struct BrowserStorage;

impl BrowserStorage {
    fn local() -> Result<Storage, ClientError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or_else(|| ClientError::Storage("localStorage is unavailable".to_string()))
    }
}

impl SessionStorage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::local().ok()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        Self::local()?
            .set_item(key, value)
            .map_err(|e| ClientError::Storage(format!("Failed to write {key}: {e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        Self::local()?
            .remove_item(key)
            .map_err(|e| ClientError::Storage(format!("Failed to remove {key}: {e:?}")))
    }
}

pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn redirect_to_login(&self) {
        go_to(LOGIN_PATH);
    }
}

pub fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| CHAT_PATH.to_string())
}

/// Full page load, so every page starts from freshly loaded session state.
pub fn go_to(path: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(e) = window.location().set_href(path) {
        tracing::warn!("Navigation to {path} failed: {e:?}");
    }
}
