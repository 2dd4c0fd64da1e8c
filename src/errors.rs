use thiserror::Error;

/// Every failure the client core can report.
/// All variants carry a human-readable message suitable for a notice.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("{message}")]
    Transport { message: String },

    #[error("Request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Session expired, please log in again")]
    Unauthorized,

    // ── Backend envelope errors ──────────────────────────────────────────────
    #[error("{message}")]
    Api { code: i64, message: String },

    #[error("Malformed response from {call}: {source}")]
    Decode {
        call: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode request for {call}: {source}")]
    Encode {
        call: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response from {call} carried no data")]
    MissingData { call: String },

    // ── Local errors ─────────────────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        ClientError::Transport { message: message.into() }
    }

    pub fn decode(call: impl Into<String>, source: serde_json::Error) -> Self {
        ClientError::Decode { call: call.into(), source }
    }

    pub fn encode(call: impl Into<String>, source: serde_json::Error) -> Self {
        ClientError::Encode { call: call.into(), source }
    }

    pub fn empty_field(field_name: impl Into<String>) -> Self {
        ClientError::EmptyField { field_name: field_name.into() }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::EmptyField { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. } | ClientError::Http { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_backend_message_verbatim() {
        let err = ClientError::Api { code: 1, message: "quota exceeded".to_string() };
        assert_eq!(err.to_string(), "quota exceeded");
        assert!(!err.is_transport());
    }

    #[test]
    fn transport_error_displays_message_verbatim() {
        let err = ClientError::transport("connection refused");
        assert_eq!(err.to_string(), "connection refused");
        assert!(err.is_transport());
    }

    #[test]
    fn encode_error_names_the_request_not_the_response() {
        let unencodable: std::collections::BTreeMap<(i32, i32), i32> = [((1, 2), 3)].into();
        let source = serde_json::to_value(&unencodable).unwrap_err();

        let err = ClientError::encode("/ai/chat", source);

        assert!(err.to_string().starts_with("Failed to encode request for /ai/chat"));
        assert!(!err.to_string().contains("Malformed response"));
    }

    #[test]
    fn predicates_classify_variants() {
        assert!(ClientError::Unauthorized.is_unauthorized());
        assert!(ClientError::empty_field("username").is_validation());
        assert!(ClientError::Http { status: 500, body: String::new() }.is_transport());
    }
}
