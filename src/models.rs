use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated identity held by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
}

impl Conversation {
    /// A conversation the client just created; the server has not listed it yet.
    pub fn new(id: String, title: String, persona_id: Option<String>) -> Self {
        Self { id, title, created_at: Utc::now(), persona_id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a conversation thread. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(id: String, role: MessageRole, content: String) -> Self {
        Self { id, role, content }
    }
}

// ── Personas & memories ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum PersonaMode {
    Custom,
    Simulation,
}

impl TryFrom<i32> for PersonaMode {
    type Error = String;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PersonaMode::Custom),
            2 => Ok(PersonaMode::Simulation),
            other => Err(format!("Unknown persona mode: {other}")),
        }
    }
}

impl From<PersonaMode> for i32 {
    fn from(mode: PersonaMode) -> Self {
        match mode {
            PersonaMode::Custom => 1,
            PersonaMode::Simulation => 2,
        }
    }
}

/// The backend emits personas and memories in snake_case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_prompt: String,
    pub mode: PersonaMode,
    #[serde(default)]
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Fact,
    Preference,
    Event,
    Emotion,
    Relationship,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Fact => "fact",
            MemoryKind::Preference => "preference",
            MemoryKind::Event => "event",
            MemoryKind::Emotion => "emotion",
            MemoryKind::Relationship => "relationship",
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fact" => Ok(MemoryKind::Fact),
            "preference" => Ok(MemoryKind::Preference),
            "event" => Ok(MemoryKind::Event),
            "emotion" => Ok(MemoryKind::Emotion),
            "relationship" => Ok(MemoryKind::Relationship),
            other => Err(format!("Unknown memory type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub persona_id: String,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    pub content: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub hit_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Wire bodies ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedConversation {
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest<'a> {
    pub query: &'a str,
    pub conversation_id: &'a str,
    pub system_prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaChatRequest<'a> {
    pub query: &'a str,
    pub conversation_id: &'a str,
    pub persona_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ConversationList {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessagesRequest<'a> {
    pub conversation_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct MessageHistory {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPersona {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    pub mode: PersonaMode,
    pub avatar: String,
}

#[derive(Debug, Deserialize)]
pub struct PersonaList {
    #[serde(default)]
    pub personas: Vec<Persona>,
}

#[derive(Debug, Deserialize)]
pub struct MemoryList {
    #[serde(default)]
    pub memories: Vec<Memory>,
}

#[derive(Debug, Serialize)]
pub struct CreateMemoryRequest<'a> {
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UpdateMemoryRequest<'a> {
    pub content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conversation_reads_camel_case_and_ignores_extra_fields() {
        let conv: Conversation = serde_json::from_value(json!({
            "id": "con:1",
            "userId": 7,
            "personaId": "per:9",
            "title": "hello",
            "createdAt": "2025-03-01T10:00:00.123456+08:00",
            "updatedAt": "2025-03-01T10:00:00+08:00"
        }))
        .unwrap();
        assert_eq!(conv.id, "con:1");
        assert_eq!(conv.persona_id.as_deref(), Some("per:9"));
        assert_eq!(conv.created_at.to_rfc3339(), "2025-03-01T02:00:00.123456+00:00");
    }

    #[test]
    fn message_role_rejects_unknown_values() {
        let bad = serde_json::from_value::<Message>(json!({
            "id": "1", "role": "tool", "content": "x"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn persona_mode_uses_numeric_codes() {
        let persona: Persona = serde_json::from_value(json!({
            "id": "per:1",
            "user_id": 3,
            "name": "Ada",
            "description": "math tutor",
            "system_prompt": "be kind",
            "mode": 2,
            "avatar": "",
            "created_at": "2025-03-01T10:00:00Z",
            "updated_at": "2025-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(persona.mode, PersonaMode::Simulation);

        let body = serde_json::to_value(NewPersona {
            name: "Ada".into(),
            description: "d".into(),
            system_prompt: "p".into(),
            mode: PersonaMode::Custom,
            avatar: String::new(),
        })
        .unwrap();
        assert_eq!(body["mode"], 1);
        assert_eq!(body["systemPrompt"], "p");

        assert!(serde_json::from_value::<PersonaMode>(json!(5)).is_err());
    }

    #[test]
    fn create_conversation_omits_missing_persona() {
        let plain = serde_json::to_value(CreateConversationRequest { title: "t", persona_id: None }).unwrap();
        assert_eq!(plain, json!({ "title": "t" }));
        let scoped =
            serde_json::to_value(CreateConversationRequest { title: "t", persona_id: Some("per:1") }).unwrap();
        assert_eq!(scoped, json!({ "title": "t", "personaId": "per:1" }));
    }

    #[test]
    fn memory_kind_parses_case_insensitively() {
        assert_eq!("Emotion".parse::<MemoryKind>(), Ok(MemoryKind::Emotion));
        assert!("rumor".parse::<MemoryKind>().is_err());
    }
}
