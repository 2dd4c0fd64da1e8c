use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::transport::{HttpMethod, HttpRequest, HttpTransport};
use crate::errors::ClientError;
use crate::models::{
    ChatReply, ChatRequest, Conversation, ConversationList, ConversationMessagesRequest,
    CreateConversationRequest, CreateMemoryRequest, CreatedConversation, LoginData, LoginRequest,
    Memory, MemoryKind, MemoryList, Message, MessageHistory, NewPersona, Persona, PersonaChatRequest,
    PersonaList, RegisterRequest, UpdateMemoryRequest,
};
use crate::navigation::Navigator;
use crate::session::SessionStore;

/// Header carrying the session token on every authenticated request.
pub const SESSION_HEADER: &str = "SessionId";

pub const SUCCESS_CODE: i64 = 0;
/// The backend reports an expired session inside a normal 200 envelope.
pub const SESSION_EXPIRED_CODE: i64 = 1005;

/// Fallback text for an error envelope that arrives without a message.
pub fn default_message(code: i64) -> &'static str {
    match code {
        0 => "success",
        1 => "Invalid request parameters",
        1001 => "Incorrect username or password",
        1002 => "Registration failed, check the input or try again later",
        1003 => "Database failure",
        1004 => "Cache failure",
        SESSION_EXPIRED_CODE => "Session expired, please log in again",
        _ => "Unknown error",
    }
}

/// `{ code, message?, data? }`, the shape of every backend response.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Uniform outbound request path.
///
/// Attaches the session token to every request and turns an authentication
/// rejection into a forced logout plus a login redirect before the error
/// reaches the caller. Callers never special-case 401.
pub struct ApiClient {
    transport: Rc<dyn HttpTransport>,
    session: Rc<SessionStore>,
    navigator: Rc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        transport: Rc<dyn HttpTransport>,
        session: Rc<SessionStore>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        Self { transport, session, navigator }
    }

    pub fn session(&self) -> &Rc<SessionStore> {
        &self.session
    }

    // ── Auth ──────────────────────────────────────────────────────────────────

    /// Returns the new session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let data: LoginData = self
            .call(HttpMethod::Post, "/auth/login", Some(&LoginRequest { username, password }))
            .await?;
        Ok(data.session_id)
    }

    pub async fn register(&self, username: &str, password: &str, email: &str) -> Result<(), ClientError> {
        self.call_unit(
            HttpMethod::Post,
            "/auth/register",
            Some(&RegisterRequest { username, password, email }),
        )
        .await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.call_unit::<()>(HttpMethod::Post, "/auth/logout", None).await
    }

    /// Connectivity test against an authenticated endpoint.
    pub async fn ping(&self) -> Result<(), ClientError> {
        self.call_unit::<()>(HttpMethod::Post, "/test", None).await
    }

    // ── Conversations ─────────────────────────────────────────────────────────

    /// Returns the id of the created (or, for a persona, reused) conversation.
    pub async fn create_conversation(
        &self,
        title: &str,
        persona_id: Option<&str>,
    ) -> Result<String, ClientError> {
        let data: CreatedConversation = self
            .call(
                HttpMethod::Post,
                "/ai/create-conversation",
                Some(&CreateConversationRequest { title, persona_id }),
            )
            .await?;
        Ok(data.conversation_id)
    }

    /// Returns the assistant's reply text.
    pub async fn send_message(
        &self,
        query: &str,
        conversation_id: &str,
        system_prompt: &str,
    ) -> Result<String, ClientError> {
        let reply: ChatReply = self
            .call(
                HttpMethod::Post,
                "/ai/chat",
                Some(&ChatRequest { query, conversation_id, system_prompt }),
            )
            .await?;
        Ok(reply.message)
    }

    pub async fn send_persona_message(
        &self,
        query: &str,
        conversation_id: &str,
        persona_id: &str,
    ) -> Result<String, ClientError> {
        let reply: ChatReply = self
            .call(
                HttpMethod::Post,
                "/ai/chat-with-persona",
                Some(&PersonaChatRequest { query, conversation_id, persona_id }),
            )
            .await?;
        Ok(reply.message)
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ClientError> {
        let list: ConversationList = self.call::<(), _>(HttpMethod::Get, "/ai/conversations", None).await?;
        Ok(list.conversations)
    }

    pub async fn conversation_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ClientError> {
        let history: MessageHistory = self
            .call(
                HttpMethod::Post,
                "/ai/conversation-messages",
                Some(&ConversationMessagesRequest { conversation_id }),
            )
            .await?;
        Ok(history.messages)
    }

    // ── Personas & memories ───────────────────────────────────────────────────

    pub async fn create_persona(&self, persona: &NewPersona) -> Result<Persona, ClientError> {
        self.call(HttpMethod::Post, "/persona/create", Some(persona)).await
    }

    pub async fn list_personas(&self) -> Result<Vec<Persona>, ClientError> {
        let list: PersonaList = self.call::<(), _>(HttpMethod::Get, "/persona/list", None).await?;
        Ok(list.personas)
    }

    pub async fn list_memories(&self, persona_id: &str) -> Result<Vec<Memory>, ClientError> {
        let path = format!("/persona/{persona_id}/memory/list");
        let list: MemoryList = self.call::<(), _>(HttpMethod::Get, &path, None).await?;
        Ok(list.memories)
    }

    pub async fn create_memory(
        &self,
        persona_id: &str,
        kind: MemoryKind,
        content: &str,
    ) -> Result<Memory, ClientError> {
        let path = format!("/persona/{persona_id}/memory/create");
        self.call(HttpMethod::Post, &path, Some(&CreateMemoryRequest { kind, content }))
            .await
    }

    pub async fn update_memory(
        &self,
        persona_id: &str,
        memory_id: &str,
        content: &str,
    ) -> Result<Memory, ClientError> {
        let path = format!("/persona/{persona_id}/memory/{memory_id}");
        self.call(HttpMethod::Put, &path, Some(&UpdateMemoryRequest { content }))
            .await
    }

    pub async fn delete_memory(&self, persona_id: &str, memory_id: &str) -> Result<(), ClientError> {
        let path = format!("/persona/{persona_id}/memory/{memory_id}");
        self.call_unit::<()>(HttpMethod::Delete, &path, None).await
    }

    // ── Plumbing ──────────────────────────────────────────────────────────────

    async fn call<B, T>(&self, method: HttpMethod, path: &str, body: Option<&B>) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let data = self
            .exchange(method, path, body)
            .await?
            .filter(|v| !v.is_null())
            .ok_or_else(|| ClientError::MissingData { call: path.to_string() })?;
        serde_json::from_value(data).map_err(|e| ClientError::decode(path, e))
    }

    async fn call_unit<B>(&self, method: HttpMethod, path: &str, body: Option<&B>) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.exchange(method, path, body).await.map(|_| ())
    }

    /// Sends one request and unwraps the envelope, returning its `data`.
    async fn exchange<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<serde_json::Value>, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = HttpRequest::new(method, path);
        if let Some(body) = body {
            request.body = Some(serde_json::to_value(body).map_err(|e| ClientError::encode(path, e))?);
        }
        if let Some(token) = self.session.token() {
            request.headers.push((SESSION_HEADER.to_string(), token));
        }

        debug!("{method} {path}");
        let response = self.transport.send(request).await.map_err(|e| {
            warn!("{method} {path} did not complete: {e}");
            e
        })?;

        if response.status == 401 {
            warn!("{method} {path} rejected as unauthorized");
            self.force_logout();
            return Err(ClientError::Unauthorized);
        }
        if !response.is_success() {
            warn!("{method} {path} returned status {}", response.status);
            return Err(ClientError::Http { status: response.status, body: response.body });
        }

        let envelope: Envelope =
            serde_json::from_str(&response.body).map_err(|e| ClientError::decode(path, e))?;

        match envelope.code {
            SUCCESS_CODE => Ok(envelope.data),
            SESSION_EXPIRED_CODE => {
                warn!("{method} {path} reported an expired session");
                self.force_logout();
                Err(ClientError::Unauthorized)
            }
            code => {
                let message = envelope
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| default_message(code).to_string());
                warn!("{method} {path} failed with code {code}: {message}");
                Err(ClientError::Api { code, message })
            }
        }
    }

    fn force_logout(&self) {
        self.session.clear_session();
        self.navigator.redirect_to_login();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{ok_response, Harness};
    use crate::api::transport::HttpResponse;
    use serde_json::json;

    #[tokio::test]
    async fn attaches_session_header_only_when_logged_in() {
        let h = Harness::logged_out();
        h.transport.reply("/test", ok_response(json!(null)));
        h.api.ping().await.unwrap();
        assert_eq!(h.transport.last_request("/test").header(SESSION_HEADER), None);

        h.session.set_session("tok-9", "ana").unwrap();
        h.transport.reply("/test", ok_response(json!(null)));
        h.api.ping().await.unwrap();
        assert_eq!(h.transport.last_request("/test").header(SESSION_HEADER), Some("tok-9"));
    }

    #[tokio::test]
    async fn unauthorized_status_forces_logout_and_redirect() {
        let h = Harness::logged_in("tok", "ana");
        h.transport
            .reply("/ai/conversations", HttpResponse { status: 401, body: String::new() });

        let err = h.api.list_conversations().await.unwrap_err();

        assert!(err.is_unauthorized());
        assert!(!h.session.is_authenticated());
        assert!(h.storage.is_empty());
        assert!(h.navigator.is_requested());
    }

    #[tokio::test]
    async fn session_expired_code_is_treated_like_unauthorized() {
        let h = Harness::logged_in("tok", "ana");
        h.transport.reply_code("/persona/list", SESSION_EXPIRED_CODE, "");

        let err = h.api.list_personas().await.unwrap_err();

        assert!(err.is_unauthorized());
        assert!(!h.session.is_authenticated());
        assert!(h.navigator.is_requested());
    }

    #[tokio::test]
    async fn other_failures_pass_through_untouched() {
        let h = Harness::logged_in("tok", "ana");
        h.transport
            .reply("/test", HttpResponse { status: 502, body: "bad gateway".into() });
        h.transport.fail("/ai/conversations", "connection refused");

        let http = h.api.ping().await.unwrap_err();
        assert!(matches!(http, ClientError::Http { status: 502, .. }));
        let transport = h.api.list_conversations().await.unwrap_err();
        assert_eq!(transport.to_string(), "connection refused");

        assert!(h.session.is_authenticated());
        assert!(!h.navigator.is_requested());
    }

    #[tokio::test]
    async fn error_code_without_message_uses_code_table() {
        let h = Harness::logged_out();
        h.transport.reply_code("/auth/login", 1001, "");

        let err = h.api.login("ana", "wrong").await.unwrap_err();

        assert!(matches!(err, ClientError::Api { code: 1001, .. }));
        assert_eq!(err.to_string(), "Incorrect username or password");
    }

    #[tokio::test]
    async fn success_without_required_data_is_reported() {
        let h = Harness::logged_in("tok", "ana");
        h.transport.reply("/ai/create-conversation", ok_response(json!(null)));

        let err = h.api.create_conversation("t", None).await.unwrap_err();

        assert!(matches!(err, ClientError::MissingData { .. }));
    }

    #[tokio::test]
    async fn wrappers_use_expected_verbs_paths_and_bodies() {
        let h = Harness::logged_in("tok", "ana");
        h.transport
            .reply("/ai/chat-with-persona", ok_response(json!({ "message": "hi there" })));
        h.transport.reply("/persona/per:1/memory/mem:2", ok_response(json!(null)));

        let reply = h.api.send_persona_message("hello", "con:1", "per:1").await.unwrap();
        h.api.delete_memory("per:1", "mem:2").await.unwrap();

        assert_eq!(reply, "hi there");
        let chat = h.transport.last_request("/ai/chat-with-persona");
        assert_eq!(chat.method, HttpMethod::Post);
        assert_eq!(
            chat.body,
            Some(json!({ "query": "hello", "conversationId": "con:1", "personaId": "per:1" }))
        );
        let delete = h.transport.last_request("/persona/per:1/memory/mem:2");
        assert_eq!(delete.method, HttpMethod::Delete);
        assert_eq!(delete.body, None);
    }
}
