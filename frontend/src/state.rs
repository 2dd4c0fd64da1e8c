use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;

use persona_chat::models::Persona;
use persona_chat::service::NOTICE_TTL;
use persona_chat::{ApiClient, AuthService, ChatState, ConversationManager, SessionStore};

use crate::api::GlooTransport;
use crate::browser::{BrowserNavigator, BrowserStorage};

/// Shared application state, provided via Leptos context.
///
/// The client core is single-threaded, so it lives in local stored values;
/// components only ever see `Copy` handles and the mirrored [`ChatState`].
#[derive(Clone, Copy)]
pub struct AppState {
    pub chat: ReadSignal<ChatState>,
    pub personas: ReadSignal<Vec<Persona>>,
    set_personas: WriteSignal<Vec<Persona>>,
    manager: StoredValue<Rc<ConversationManager>, LocalStorage>,
    auth: StoredValue<Rc<AuthService>, LocalStorage>,
    session: StoredValue<Rc<SessionStore>, LocalStorage>,
    api: StoredValue<Rc<ApiClient>, LocalStorage>,
}

impl AppState {
    /// Wire the client core and provide the state in the current Leptos context.
    pub fn provide() -> Self {
        let session = Rc::new(SessionStore::load(Rc::new(BrowserStorage)));
        let navigator = Rc::new(BrowserNavigator);
        let api = Rc::new(ApiClient::new(Rc::new(GlooTransport), session.clone(), navigator.clone()));
        let auth = Rc::new(AuthService::new(api.clone(), session.clone(), navigator));
        let manager = Rc::new(ConversationManager::new(api.clone()));

        let (chat, set_chat) = signal(manager.state());
        manager.subscribe(move |s| set_chat.set(s.clone()));
        let (personas, set_personas) = signal(Vec::<Persona>::new());

        let state = Self {
            chat,
            personas,
            set_personas,
            manager: StoredValue::new_local(manager),
            auth: StoredValue::new_local(auth),
            session: StoredValue::new_local(session),
            api: StoredValue::new_local(api),
        };
        state.expire_notices();

        provide_context(state);
        state
    }

    /// Each notice is dismissed `NOTICE_TTL` after it appears, unless replaced first.
    fn expire_notices(&self) {
        let chat = self.chat;
        let manager = self.manager;
        let notice_id = Memo::new(move |_| chat.with(|s| s.notice.as_ref().map(|n| n.id)));
        Effect::new(move |_| {
            let Some(id) = notice_id.get() else {
                return;
            };
            let manager = manager.get_value();
            Timeout::new(NOTICE_TTL.as_millis() as u32, move || manager.dismiss_notice(id)).forget();
        });
    }

    pub fn auth(&self) -> Rc<AuthService> {
        self.auth.get_value()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.with_value(|s| s.is_authenticated())
    }

    pub fn username(&self) -> Option<String> {
        self.session.with_value(|s| s.username())
    }

    /// Initial load of the chat view.
    pub fn start(&self) {
        let manager = self.manager.get_value();
        spawn_local(async move {
            manager.initialize().await;
        });

        let api = self.api.get_value();
        let set_personas = self.set_personas;
        spawn_local(async move {
            match api.list_personas().await {
                Ok(personas) => set_personas.set(personas),
                Err(e) => tracing::warn!("Failed to fetch personas: {e}"),
            }
        });
    }

    pub fn set_draft(&self, text: String) {
        self.manager.with_value(|m| m.set_draft(text));
    }

    pub fn send(&self) {
        let manager = self.manager.get_value();
        spawn_local(async move {
            manager.send().await;
        });
    }

    pub fn new_conversation(&self) {
        let manager = self.manager.get_value();
        spawn_local(async move {
            manager.create_conversation(None).await;
        });
    }

    pub fn switch_conversation(&self, id: String) {
        let manager = self.manager.get_value();
        spawn_local(async move {
            manager.switch_conversation(&id).await;
        });
    }

    pub fn select_persona(&self, persona_id: Option<String>) {
        self.manager.with_value(|m| m.select_persona(persona_id));
    }

    pub fn test_connectivity(&self) {
        let manager = self.manager.get_value();
        spawn_local(async move {
            manager.test_connectivity().await;
        });
    }

    pub fn dismiss_notice(&self, id: u64) {
        self.manager.with_value(|m| m.dismiss_notice(id));
    }

    pub fn logout(&self) {
        let auth = self.auth();
        spawn_local(async move {
            auth.logout().await;
        });
    }
}
