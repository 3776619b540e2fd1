use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{AnswerId, CommentId, ParentRef, QuestionId, UserId},
    error::ValidationError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "id", alias = "_id")]
    pub comment_id: CommentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_id: Option<AnswerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Comment {
    /// The owning entity. An answer reference takes precedence if a record
    /// carries both.
    pub fn parent(&self) -> Option<ParentRef> {
        match (&self.answer_id, &self.question_id) {
            (Some(answer_id), _) => Some(ParentRef::Answer(answer_id.clone())),
            (None, Some(question_id)) => Some(ParentRef::Question(question_id.clone())),
            (None, None) => None,
        }
    }
}

// Some backends emit local timestamps without an offset; those are read as
// UTC and anything unparseable is dropped rather than failing the comment.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }))
}

/// Client-side draft of a new comment. Extra fields are passed through to the
/// create request untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentDraft {
    body: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl CommentDraft {
    pub fn new(body: impl Into<String>) -> Result<Self, ValidationError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(Self {
            body,
            extra: Map::new(),
        })
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        // The parent is always taken from the command, never from the draft.
        if key != "body" && key != "answerId" {
            self.extra.insert(key, value.into());
        }
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest<'a> {
    #[serde(flatten)]
    pub draft: &'a CommentDraft,
    pub answer_id: &'a AnswerId,
}

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(DEFAULT_PAGE, page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListCommentsQuery {
    pub page: u32,
    pub size: u32,
    #[serde(rename = "isDeleted")]
    pub is_deleted: bool,
}

impl From<PageRequest> for ListCommentsQuery {
    fn from(value: PageRequest) -> Self {
        Self {
            page: value.page,
            size: value.page_size,
            is_deleted: false,
        }
    }
}

/// Success bodies arrive either wrapped as `{ "result": ... }` or bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { result: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { result } => result,
            Envelope::Bare(inner) => inner,
        }
    }
}

/// The by-answer listing pages its results under `data`; the by-question
/// listing returns the array directly. Both decode here.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommentList {
    Paged { data: Vec<Comment> },
    Plain(Vec<Comment>),
}

impl CommentList {
    pub fn into_comments(self) -> Vec<Comment> {
        match self {
            CommentList::Paged { data } => data,
            CommentList::Plain(comments) => comments,
        }
    }
}
