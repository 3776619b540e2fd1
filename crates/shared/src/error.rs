use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Server,
    Validation,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Server => "server",
            FailureKind::Validation => "validation",
        }
    }
}

/// Error body returned by the comments API on a non-success status.
///
/// Every field is optional: the backend sends `{ code, message }` for
/// application errors and `{ status, error, message }` when the framework
/// itself rejects the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice::<ApiErrorBody>(body)
            .ok()
            .filter(|parsed| parsed.code.is_some() || parsed.describe().is_some())
    }

    /// The first non-blank of `message` and `error`.
    pub fn describe(&self) -> Option<&str> {
        let non_blank = |text: &&str| !text.trim().is_empty();
        self.message
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.error.as_deref().filter(non_blank))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("comment body must not be empty")]
    EmptyBody,
}
