use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{AnswerId, CommentId, QuestionId},
    error::{ApiErrorBody, FailureKind, ValidationError},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentError {
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("server responded with {status}: {message}")]
    Server {
        status: u16,
        code: Option<i64>,
        message: String,
    },
    #[error("invalid comment: {0}")]
    Validation(String),
}

impl CommentError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CommentError::Transport { .. } => FailureKind::Transport,
            CommentError::Server { .. } => FailureKind::Server,
            CommentError::Validation(_) => FailureKind::Validation,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CommentError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        CommentError::Transport {
            message: message.into(),
        }
    }

    /// Builds a server error from a non-success response body, preferring the
    /// structured message and falling back to raw text, then the reason phrase.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        if let Some(parsed) = ApiErrorBody::parse(body) {
            let message = parsed
                .describe()
                .map(str::to_string)
                .unwrap_or_else(|| reason(status));
            return CommentError::Server {
                status: status.as_u16(),
                code: parsed.code,
                message,
            };
        }

        let text = String::from_utf8_lossy(body).trim().to_string();
        CommentError::Server {
            status: status.as_u16(),
            code: None,
            message: if text.is_empty() { reason(status) } else { text },
        }
    }

    pub fn malformed_body(status: StatusCode, err: &serde_json::Error) -> Self {
        CommentError::Server {
            status: status.as_u16(),
            code: None,
            message: format!("malformed response body: {err}"),
        }
    }
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unexpected status")
        .to_string()
}

impl From<reqwest::Error> for CommentError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => CommentError::Server {
                status: status.as_u16(),
                code: None,
                message: value.to_string(),
            },
            None => CommentError::transport(value.to_string()),
        }
    }
}

impl From<ValidationError> for CommentError {
    fn from(value: ValidationError) -> Self {
        CommentError::Validation(value.to_string())
    }
}

/// Which command a failure came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum CommentOperation {
    Create { answer_id: AnswerId },
    Delete { comment_id: CommentId },
    FetchForAnswer { answer_id: AnswerId, page: u32 },
    FetchForQuestion { question_id: QuestionId, page: u32 },
    Draft,
}

impl CommentOperation {
    pub fn name(&self) -> &'static str {
        match self {
            CommentOperation::Create { .. } => "create_comment",
            CommentOperation::Delete { .. } => "delete_comment",
            CommentOperation::FetchForAnswer { .. } => "fetch_comments_for_answer",
            CommentOperation::FetchForQuestion { .. } => "fetch_comments_for_question",
            CommentOperation::Draft => "validate_draft",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentFailure {
    pub kind: FailureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
    pub operation: CommentOperation,
}

impl CommentFailure {
    pub fn new(operation: CommentOperation, err: &CommentError) -> Self {
        Self {
            kind: err.kind(),
            status: err.status(),
            message: err.to_string(),
            operation,
        }
    }
}
