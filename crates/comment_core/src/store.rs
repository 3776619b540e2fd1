//! Synchronous fold of outcome events into the comment cache.

use std::collections::HashMap;

use shared::{
    domain::{AnswerId, CommentId, ParentRef, QuestionId},
    protocol::Comment,
};

use crate::{error::CommentFailure, events::CommentEvent, sync::Generation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPage {
    pub page: u32,
    pub page_size: u32,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentStore {
    created: Vec<Comment>,
    by_parent: HashMap<ParentRef, CommentPage>,
    applied_generations: HashMap<ParentRef, Generation>,
    last_error: Option<CommentFailure>,
}

/// Folds one event into `store` and returns the next state.
pub fn reduce(mut store: CommentStore, event: &CommentEvent) -> CommentStore {
    store.apply(event);
    store
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns `false` when the event was discarded as superseded.
    pub fn apply(&mut self, event: &CommentEvent) -> bool {
        match event {
            // Parent-scoped views only change through a fetch.
            CommentEvent::CommentCreated(comment) => {
                self.created.push(comment.clone());
                self.last_error = None;
            }
            CommentEvent::CommentDeleted(_) => {
                self.last_error = None;
            }
            CommentEvent::CommentsLoaded {
                parent,
                page,
                page_size,
                generation,
                comments,
            } => {
                if self
                    .applied_generations
                    .get(parent)
                    .is_some_and(|applied| generation < applied)
                {
                    return false;
                }
                self.applied_generations.insert(parent.clone(), *generation);
                self.by_parent.insert(
                    parent.clone(),
                    CommentPage {
                        page: *page,
                        page_size: *page_size,
                        comments: comments.clone(),
                    },
                );
                self.last_error = None;
            }
            CommentEvent::CommentOperationFailed(failure) => {
                self.last_error = Some(failure.clone());
            }
        }
        true
    }

    pub fn comments_for(&self, parent: &ParentRef) -> &[Comment] {
        self.by_parent
            .get(parent)
            .map(|page| page.comments.as_slice())
            .unwrap_or_default()
    }

    pub fn comments_for_answer(&self, answer_id: &AnswerId) -> &[Comment] {
        self.comments_for(&ParentRef::Answer(answer_id.clone()))
    }

    pub fn comments_for_question(&self, question_id: &QuestionId) -> &[Comment] {
        self.comments_for(&ParentRef::Question(question_id.clone()))
    }

    pub fn page(&self, parent: &ParentRef) -> Option<&CommentPage> {
        self.by_parent.get(parent)
    }

    pub fn is_loaded(&self, parent: &ParentRef) -> bool {
        self.by_parent.contains_key(parent)
    }

    /// Every comment created this session, in settlement order.
    pub fn created(&self) -> &[Comment] {
        &self.created
    }

    pub fn last_error(&self) -> Option<&CommentFailure> {
        self.last_error.as_ref()
    }

    pub fn locate(&self, comment_id: &CommentId) -> Option<(&ParentRef, &CommentPage)> {
        self.by_parent.iter().find(|(_, page)| {
            page.comments
                .iter()
                .any(|comment| &comment.comment_id == comment_id)
        })
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
