use crate::resources::ResourceKind;
use thiserror::Error;

/// Errors surfaced by the connector core to its orchestrator.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The pagination cursor could not be decoded. Fatal to the call, not the session.
    #[error("malformed pagination cursor: {0}")]
    Decode(String),

    /// The Vault server could not be reached or answered with an error status.
    #[error("vault request failed{}: {message}", status_suffix(.status))]
    Transport { status: Option<u16>, message: String },

    /// The request was aborted by the caller before it completed.
    #[error("vault request cancelled")]
    Cancelled,

    #[error("only users can hold policy membership, got principal of kind {0}")]
    UnsupportedPrincipalKind(ResourceKind),

    #[error("user {user} does not have policy {policy}")]
    PolicyNotAssigned { user: String, policy: String },

    #[error("{operation} is not supported for {kind} resources")]
    UnsupportedOperation {
        kind: ResourceKind,
        operation: &'static str,
    },

    #[error("failed to enable backend at '{path}': {source}")]
    Bootstrap {
        path: String,
        #[source]
        source: Box<ConnectorError>,
    },

    /// A name that cannot be used as a single Vault path segment.
    #[error("'{0}' is not a valid vault object name")]
    InvalidName(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to decode vault response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConnectorError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        ConnectorError::Transport {
            status,
            message: message.into(),
        }
    }

    /// Whether the caller may retry the same call (with the same cursor).
    pub fn is_retryable(&self) -> bool {
        match self {
            ConnectorError::Cancelled => true,
            ConnectorError::Transport { status, .. } => match status {
                None => true,
                Some(code) => *code >= 500 || *code == 429,
            },
            ConnectorError::Bootstrap { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        ConnectorError::transport(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(ConnectorError::transport(Some(503), "sealed").is_retryable());
        assert!(ConnectorError::transport(Some(429), "rate limited").is_retryable());
        assert!(ConnectorError::transport(None, "connection reset").is_retryable());
        assert!(ConnectorError::Cancelled.is_retryable());
    }

    #[test]
    fn user_facing_errors_are_terminal() {
        assert!(!ConnectorError::transport(Some(403), "permission denied").is_retryable());
        assert!(!ConnectorError::Decode("bad".into()).is_retryable());
        assert!(!ConnectorError::UnsupportedPrincipalKind(ResourceKind::Group).is_retryable());
        assert!(!ConnectorError::PolicyNotAssigned {
            user: "alice".into(),
            policy: "ops".into(),
        }
        .is_retryable());
        assert!(!ConnectorError::InvalidName("..".into()).is_retryable());
    }

    #[test]
    fn transport_message_includes_status() {
        let err = ConnectorError::transport(Some(400), "missing client token");
        assert_eq!(
            err.to_string(),
            "vault request failed (400): missing client token"
        );
        let err = ConnectorError::transport(None, "dns error");
        assert_eq!(err.to_string(), "vault request failed: dns error");
    }
}
