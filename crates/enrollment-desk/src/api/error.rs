use serde_json::Value;

/// Banner text used whenever the server gave nothing more specific.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong!";

/// Failure talking to the back-office REST API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {path} failed: {detail}")]
    Transport { path: String, detail: String },
    #[error("server rejected request to {path} ({status}): {message}")]
    Rejected {
        path: String,
        status: u16,
        message: String,
    },
    #[error("unexpected payload from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot build request url for '{path}': {source}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

impl ApiError {
    /// Text suitable for an operator-facing error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Transport { .. } | ApiError::Decode { .. } | ApiError::InvalidUrl { .. } => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pulls the human readable message out of an error body.
///
/// Accepts `{"message": "..."}`, `{"message": ["...", ...]}` (validation
/// pipes report arrays) and `{"errors": [{"message": "..."}]}`.
pub fn extract_message(body: &Value) -> Option<String> {
    match body.get("message") {
        Some(Value::String(message)) if !message.trim().is_empty() => {
            return Some(message.clone());
        }
        Some(Value::Array(messages)) => {
            if let Some(Value::String(first)) = messages.first() {
                return Some(first.clone());
            }
        }
        _ => {}
    }

    body.get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(|first| first.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
