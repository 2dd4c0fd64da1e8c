pub mod auth_service;
pub mod chat_service;

pub use auth_service::{AuthService, REGISTER_REDIRECT_DELAY};
pub use chat_service::{
    ChatState, ConversationManager, Notice, NoticeKind, SendOutcome, SwitchOutcome, NOTICE_TTL,
};
