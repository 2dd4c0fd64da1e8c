//! Client core for a persona-aware AI chat backend.
//!
//! Session state, the authenticated API client and the conversation manager
//! are host-agnostic: the terminal client (`native` feature) and the browser
//! frontend plug in their own transport, storage and navigation.

pub mod api;
#[cfg(feature = "native")]
pub mod cli;
#[cfg(feature = "native")]
pub mod config;
pub mod errors;
pub mod models;
pub mod navigation;
pub mod service;
pub mod session;
pub mod storage;

pub use api::{ApiClient, HttpTransport};
pub use errors::ClientError;
pub use navigation::{LoginRedirect, Navigator};
pub use service::{AuthService, ChatState, ConversationManager};
pub use session::SessionStore;
