use vigil_core::validate::ValidationError;

/// Everything a backend call can fail with.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Login rejected, or the session probe after login did not pass.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// A protected endpoint answered with a redirect (expired/invalid session).
    #[error("session rejected: redirected with {status}")]
    Redirected {
        status: u16,
        location: Option<String>,
    },
    /// A protected endpoint answered 401/403.
    #[error("session rejected: {status}")]
    Unauthorized { status: u16 },
    #[error("{status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ClientError {
    /// True when the error means the caller is no longer logged in.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_) | Self::Redirected { .. } | Self::Unauthorized { .. }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Redirected { status, .. }
            | Self::Unauthorized { status }
            | Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message the backend put in an error body: a JSON string, a JSON
    /// object's `message`, or the raw text.
    pub fn server_message(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        let body = body.trim();
        if body.is_empty() {
            return None;
        }
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::String(s)) => Some(s),
            Ok(serde_json::Value::Object(map)) => map
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => Some(body.chars().take(200).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, body: &str) -> ClientError {
        ClientError::Status {
            status: code,
            body: body.to_string(),
        }
    }

    #[test]
    fn session_expiry_classification() {
        assert!(
            ClientError::Redirected {
                status: 307,
                location: None
            }
            .is_session_expired()
        );
        assert!(ClientError::Unauthorized { status: 401 }.is_session_expired());
        assert!(!status(500, "").is_session_expired());
        assert!(!ClientError::Validation(ValidationError::Required("name")).is_session_expired());
    }

    #[test]
    fn server_message_shapes() {
        assert_eq!(
            status(409, r#""trying to create an element already present""#)
                .server_message()
                .as_deref(),
            Some("trying to create an element already present")
        );
        assert_eq!(
            status(400, r#"{"message":"bad name"}"#).server_message().as_deref(),
            Some("bad name")
        );
        assert_eq!(
            status(500, "Database error").server_message().as_deref(),
            Some("Database error")
        );
        assert_eq!(status(500, "  ").server_message(), None);
        assert_eq!(status(500, "[1,2]").server_message().as_deref(), Some("[1,2]"));
    }
}
