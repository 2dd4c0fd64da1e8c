use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ClientError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the terminal client, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// `CHAT_API_BASE_URL`
    pub api_base_url: String,
    /// `CHAT_STATE_FILE`, where the session survives between runs.
    pub state_file: PathBuf,
    /// `CHAT_REQUEST_TIMEOUT_SECS`
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        let api_base_url = std::env::var("CHAT_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let state_file = match std::env::var_os("CHAT_STATE_FILE") {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_state_file()?,
        };

        let request_timeout = match std::env::var("CHAT_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ClientError::Config(format!("CHAT_REQUEST_TIMEOUT_SECS must be a whole number, got '{raw}'"))
                })?;
                if secs == 0 {
                    return Err(ClientError::Config(
                        "CHAT_REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self { api_base_url, state_file, request_timeout })
    }

    pub fn with_api_base_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.api_base_url = url;
        }
        self
    }
}

fn default_state_file() -> Result<PathBuf, ClientError> {
    let base = dirs::config_dir()
        .ok_or_else(|| ClientError::Config("No config directory; set CHAT_STATE_FILE".to_string()))?;
    Ok(base.join("persona-chat").join("session.json"))
}
