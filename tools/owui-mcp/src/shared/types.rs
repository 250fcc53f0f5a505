use owui_client::ClientError;
use serde::Serialize;
use uuid::Uuid;

/// Machine-readable failure classification surfaced on the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ToolNotFound,
    InvalidArguments,
    Auth,
    NotFound,
    RateLimited,
    Remote,
    Transport,
    Decode,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ToolNotFound => "tool_not_found",
            FailureKind::InvalidArguments => "invalid_arguments",
            FailureKind::Auth => "auth",
            FailureKind::NotFound => "not_found",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Remote => "remote",
            FailureKind::Transport => "transport",
            FailureKind::Decode => "decode",
        }
    }

    pub fn from_client_error(err: &ClientError) -> Self {
        match err {
            ClientError::Auth { .. } => FailureKind::Auth,
            ClientError::NotFound { .. } => FailureKind::NotFound,
            ClientError::RateLimited { .. } => FailureKind::RateLimited,
            ClientError::Api { .. } => FailureKind::Remote,
            ClientError::Transport(_) => FailureKind::Transport,
            ClientError::Decode(_) => FailureKind::Decode,
        }
    }
}

/// One offending argument field and what was wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFault {
    pub field: String,
    pub reason: String,
}

impl FieldFault {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Per-request trace attached to every protocol result's metadata.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchTrace {
    pub request_id: Uuid,
    pub tool_name: String,
    pub state: String,
    pub started_at: String,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds_serialize_snake_case() {
        let value = serde_json::to_value(FailureKind::ToolNotFound).unwrap();
        assert_eq!(value, serde_json::json!("tool_not_found"));
        assert_eq!(FailureKind::RateLimited.as_str(), "rate_limited");
    }

    #[test]
    fn client_errors_map_to_kinds() {
        let err = ClientError::NotFound {
            message: "gone".into(),
        };
        assert_eq!(FailureKind::from_client_error(&err), FailureKind::NotFound);
        let err = ClientError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(FailureKind::from_client_error(&err), FailureKind::Remote);
    }
}
