//! Client error taxonomy
//!
//! Every REST wrapper surfaces failures as one `ClientError` carrying a
//! human-readable message.

use cursor_pagination::LoadError;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// No response: connection refused, DNS, timeout
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-2xx response with a JSON body
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// Non-2xx response whose body is not JSON (HTML error page, proxy text)
    #[error("{message} (HTTP {status}, {content_type})")]
    UnexpectedBody {
        status: u16,
        content_type: String,
        message: String,
    },

    /// 2xx response that does not match the endpoint's declared shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Rejected locally, no request was made
    #[error("{0}")]
    Validation(String),

    /// The operation needs the signed-in user's id and there is none
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Session error: {0}")]
    Session(#[from] session_core::SessionError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::UnexpectedBody { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a 401 response; deciding what to do about it is up to the caller
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message suitable for a toast or inline error
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::UnexpectedBody { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if err.is_builder() {
            ClientError::Validation(format!("Invalid request: {}", err))
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<LoadError<ClientError>> for ClientError {
    fn from(err: LoadError<ClientError>) -> Self {
        err.into_source()
    }
}

/// Error body as the services send it
///
/// `message` is either a string or a list of validation messages.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message
            .and_then(flatten_message)
            .or_else(|| self.error.and_then(flatten_message))
    }
}

fn flatten_message(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(flatten_message).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(mut map) => map.remove("message").and_then(flatten_message),
        _ => None,
    }
}
