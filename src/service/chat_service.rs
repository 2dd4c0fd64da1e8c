use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::errors::ClientError;
use crate::models::{Conversation, Message, MessageRole};

/// How long hosts keep a notice on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional AI assistant.";

pub fn default_title(username: &str) -> String {
    format!("New conversation with {username}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient status line. Dismissed by id so an old timer never hides a newer notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub text: String,
}

/// Everything the chat view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub active_conversation: Option<String>,
    pub messages: Vec<Message>,
    pub conversations: Vec<Conversation>,
    pub selected_persona: Option<String>,
    pub draft: String,
    pub is_sending: bool,
    pub is_creating: bool,
    pub is_loading_history: bool,
    pub is_testing: bool,
    pub notice: Option<Notice>,
}

impl ChatState {
    /// While true the view accepts neither sends nor creates.
    pub fn is_busy(&self) -> bool {
        self.is_sending || self.is_creating
    }

    /// A send also waits for history: the load would replace the appended message.
    pub fn can_send(&self) -> bool {
        !self.is_busy() && !self.is_loading_history
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank draft, another send/create still outstanding, or history still loading.
    Ignored,
    Replied,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Target was already active.
    Unchanged,
    Loaded,
    Failed,
    /// A later switch or create took over before the history arrived.
    Superseded,
}

/// Client-side ids for locally authored messages: Unix milliseconds, forced to
/// be strictly increasing. Display keys only, never a stable identity.
#[derive(Debug, Default)]
pub struct MessageIds {
    last: Cell<i64>,
}

impl MessageIds {
    pub fn next(&self) -> String {
        let id = Utc::now().timestamp_millis().max(self.last.get() + 1);
        self.last.set(id);
        id.to_string()
    }
}

/// Keeps the visible conversation consistent with user actions and the backend.
///
/// Each flow is single-flight against itself. Conversation switches are fenced
/// by a generation counter: a history response that arrives after a newer
/// switch (or a create) is dropped.
pub struct ConversationManager {
    api: Rc<ApiClient>,
    ids: MessageIds,
    state: RefCell<ChatState>,
    generation: Cell<u64>,
    next_notice: Cell<u64>,
    observer: RefCell<Option<Box<dyn Fn(&ChatState)>>>,
}

impl ConversationManager {
    pub fn new(api: Rc<ApiClient>) -> Self {
        Self {
            api,
            ids: MessageIds::default(),
            state: RefCell::new(ChatState::default()),
            generation: Cell::new(0),
            next_notice: Cell::new(0),
            observer: RefCell::new(None),
        }
    }

    pub fn state(&self) -> ChatState {
        self.state.borrow().clone()
    }

    /// Registers the callback run after every state change, replacing any previous one.
    pub fn subscribe(&self, observer: impl Fn(&ChatState) + 'static) {
        *self.observer.borrow_mut() = Some(Box::new(observer));
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|s| s.draft = text);
    }

    /// Persona used by later creates and sends. Leaves the active conversation alone.
    pub fn select_persona(&self, persona_id: Option<String>) {
        self.update(|s| s.selected_persona = persona_id);
    }

    pub fn dismiss_notice(&self, id: u64) {
        if self.state.borrow().notice.as_ref().map(|n| n.id) != Some(id) {
            return;
        }
        self.update(|s| s.notice = None);
    }

    /// Initial fetch of the sidebar.
    pub async fn initialize(&self) -> bool {
        self.load_conversations().await
    }

    pub async fn load_conversations(&self) -> bool {
        match self.api.list_conversations().await {
            Ok(conversations) => {
                self.update(|s| s.conversations = conversations);
                true
            }
            Err(e) => {
                self.notify_error(format!("Failed to load conversations: {e}"));
                false
            }
        }
    }

    /// Explicit "new conversation". `None` uses the default title.
    pub async fn create_conversation(&self, title: Option<&str>) -> bool {
        if self.state.borrow().is_busy() {
            debug!("Create ignored: another request is outstanding");
            return false;
        }

        self.update(|s| s.is_creating = true);
        let result = self.create(title).await;
        self.update(|s| s.is_creating = false);

        match result {
            Ok(_) => {
                self.notify(NoticeKind::Success, "Conversation created, start chatting!".to_string());
                self.load_conversations().await;
                true
            }
            Err(e) => {
                self.notify_error(format!("Failed to create conversation: {e}"));
                false
            }
        }
    }

    /// Convenience for hosts without a bound input: replaces the draft, then sends it.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if !self.state.borrow().can_send() {
            return SendOutcome::Ignored;
        }
        self.set_draft(text);
        self.send().await
    }

    /// Sends the current draft, creating a conversation first when none is active.
    pub async fn send(&self) -> SendOutcome {
        let (draft, active, persona) = {
            let s = self.state.borrow();
            if s.draft.trim().is_empty() || !s.can_send() {
                return SendOutcome::Ignored;
            }
            (s.draft.clone(), s.active_conversation.clone(), s.selected_persona.clone())
        };

        let mut created = false;
        let conversation_id = match active {
            Some(id) => id,
            None => {
                self.update(|s| s.is_creating = true);
                let result = self.create(None).await;
                self.update(|s| s.is_creating = false);
                match result {
                    Ok(id) => {
                        created = true;
                        id
                    }
                    Err(e) => {
                        // The draft stays put so the user can retry.
                        self.notify_error(format!("Failed to create conversation: {e}"));
                        return SendOutcome::Failed;
                    }
                }
            }
        };

        let user_message = Message::new(self.ids.next(), MessageRole::User, draft.clone());
        self.update(|s| {
            s.messages.push(user_message);
            s.draft.clear();
            s.is_sending = true;
        });
        let generation = self.generation.get();

        let result = match &persona {
            Some(persona_id) => {
                self.api
                    .send_persona_message(&draft, &conversation_id, persona_id)
                    .await
            }
            None => {
                self.api
                    .send_message(&draft, &conversation_id, DEFAULT_SYSTEM_PROMPT)
                    .await
            }
        };

        let outcome = match result {
            Ok(reply) => {
                let assistant = Message::new(self.ids.next(), MessageRole::Assistant, reply);
                let current = self.generation.get() == generation;
                if !current {
                    debug!("Dropping reply for {conversation_id}: view moved on");
                }
                self.update(|s| {
                    if current {
                        s.messages.push(assistant);
                    }
                    s.is_sending = false;
                });
                SendOutcome::Replied
            }
            Err(e) => {
                self.update(|s| s.is_sending = false);
                self.notify_error(format!("Chat request failed: {e}"));
                SendOutcome::Failed
            }
        };

        if created {
            self.load_conversations().await;
        }
        outcome
    }

    /// Makes `conversation_id` active and loads its history.
    pub async fn switch_conversation(&self, conversation_id: &str) -> SwitchOutcome {
        if self.state.borrow().active_conversation.as_deref() == Some(conversation_id) {
            return SwitchOutcome::Unchanged;
        }

        let generation = self.fence();
        self.update(|s| {
            s.active_conversation = Some(conversation_id.to_string());
            s.is_loading_history = true;
        });

        let result = self.api.conversation_messages(conversation_id).await;

        if self.generation.get() != generation {
            debug!("Discarding stale history for {conversation_id}");
            return SwitchOutcome::Superseded;
        }

        match result {
            Ok(messages) => {
                self.update(|s| {
                    s.messages = messages;
                    s.is_loading_history = false;
                });
                SwitchOutcome::Loaded
            }
            Err(e) => {
                self.update(|s| s.is_loading_history = false);
                self.notify_error(format!("Failed to load conversation: {e}"));
                SwitchOutcome::Failed
            }
        }
    }

    pub async fn test_connectivity(&self) -> bool {
        if self.state.borrow().is_testing {
            return false;
        }

        self.update(|s| s.is_testing = true);
        let result = self.api.ping().await;
        self.update(|s| s.is_testing = false);

        match result {
            Ok(()) => {
                self.notify(NoticeKind::Success, "API connectivity test succeeded".to_string());
                true
            }
            Err(e) => {
                self.notify_error(format!("Connectivity test failed: {e}"));
                false
            }
        }
    }

    /// Issues the create call and, on success, makes the new conversation active.
    async fn create(&self, title: Option<&str>) -> Result<String, ClientError> {
        let title = match title {
            Some(t) => t.to_string(),
            None => default_title(&self.api.session().username().unwrap_or_default()),
        };
        let persona = self.state.borrow().selected_persona.clone();

        let id = self.api.create_conversation(&title, persona.as_deref()).await?;
        info!("Created conversation {id}");

        self.fence();
        self.update(|s| {
            s.active_conversation = Some(id.clone());
            s.messages.clear();
            s.is_loading_history = false;
            s.conversations.retain(|c| c.id != id);
            s.conversations.insert(0, Conversation::new(id.clone(), title, persona));
        });
        Ok(id)
    }

    /// Invalidates every outstanding history load.
    fn fence(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    fn notify(&self, kind: NoticeKind, text: String) {
        let id = self.next_notice.get() + 1;
        self.next_notice.set(id);
        self.update(|s| s.notice = Some(Notice { id, kind, text }));
    }

    fn notify_error(&self, text: String) {
        self.notify(NoticeKind::Error, text);
    }

    fn update<R>(&self, f: impl FnOnce(&mut ChatState) -> R) -> R {
        let result = f(&mut self.state.borrow_mut());
        let snapshot = self.state.borrow().clone();
        if let Some(observer) = self.observer.borrow().as_ref() {
            observer(&snapshot);
        }
        result
    }
}
