use std::rc::Rc;
use std::time::Duration;

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::errors::ClientError;
use crate::models::Session;
use crate::navigation::Navigator;
use crate::session::SessionStore;

/// Delay between a successful registration and the move to the login page.
pub const REGISTER_REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Login, registration and logout on top of the API client and session store.
pub struct AuthService {
    api: Rc<ApiClient>,
    session: Rc<SessionStore>,
    navigator: Rc<dyn Navigator>,
}

impl AuthService {
    pub fn new(api: Rc<ApiClient>, session: Rc<SessionStore>, navigator: Rc<dyn Navigator>) -> Self {
        Self { api, session, navigator }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        require("username", username)?;
        require("password", password)?;

        let token = self.api.login(username, password).await?;
        self.session.set_session(&token, username)?;
        info!("Logged in as {username}");
        Ok(Session { token, username: username.to_string() })
    }

    pub async fn register(&self, username: &str, password: &str, email: &str) -> Result<(), ClientError> {
        require("username", username)?;
        require("email", email)?;
        require("password", password)?;

        self.api.register(username, password, email).await?;
        info!("Registered {username}");
        Ok(())
    }

    /// Always ends logged out on the login page, whatever the backend says.
    pub async fn logout(&self) {
        if self.session.is_authenticated() {
            if let Err(e) = self.api.logout().await {
                warn!("Logout request failed: {e}");
            }
        }
        self.session.clear_session();
        self.navigator.redirect_to_login();
    }
}

fn require(field_name: &str, value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::empty_field(field_name));
    }
    Ok(())
}
