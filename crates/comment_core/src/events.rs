use shared::{
    domain::{CommentId, ParentRef},
    protocol::Comment,
};

use crate::{
    error::{CommentFailure, CommentOperation},
    sync::Generation,
};

/// The single outcome a comment command settles with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentEvent {
    CommentCreated(Comment),
    CommentDeleted(CommentId),
    CommentsLoaded {
        parent: ParentRef,
        page: u32,
        page_size: u32,
        generation: Generation,
        comments: Vec<Comment>,
    },
    CommentOperationFailed(CommentFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user-facing notification accompanying an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

impl CommentEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, CommentEvent::CommentOperationFailed(_))
    }

    pub fn failure(&self) -> Option<&CommentFailure> {
        match self {
            CommentEvent::CommentOperationFailed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommentEvent::CommentCreated(_) => "comment_created",
            CommentEvent::CommentDeleted(_) => "comment_deleted",
            CommentEvent::CommentsLoaded { .. } => "comments_loaded",
            CommentEvent::CommentOperationFailed(_) => "comment_operation_failed",
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            CommentEvent::CommentCreated(_) => Notice::success("Comment created successfully!"),
            CommentEvent::CommentDeleted(_) => Notice::success("Comment deleted successfully!"),
            CommentEvent::CommentsLoaded { comments, .. } => match comments.len() {
                1 => Notice::success("Loaded 1 comment"),
                count => Notice::success(format!("Loaded {count} comments")),
            },
            CommentEvent::CommentOperationFailed(failure) => match &failure.operation {
                CommentOperation::Create { .. } => Notice::error("Error creating comment"),
                CommentOperation::Delete { .. } => Notice::error("Error deleting comment"),
                CommentOperation::FetchForAnswer { .. } => {
                    Notice::error("Error fetching comments for answer")
                }
                CommentOperation::FetchForQuestion { .. } => {
                    Notice::error("Error fetching comments for question")
                }
                CommentOperation::Draft => Notice::error(failure.message.clone()),
            },
        }
    }
}
