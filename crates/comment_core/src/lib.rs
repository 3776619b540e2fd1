use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use shared::{
    domain::{AnswerId, CommentId, ParentRef, QuestionId},
    protocol::{Comment, CommentDraft, PageRequest},
};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod store;
pub mod sync;

pub use api::{CommentApi, HttpCommentApi};
pub use config::{load_settings, load_settings_from, ClientSettings};
pub use error::{CommentError, CommentFailure, CommentOperation};
pub use events::{CommentEvent, Notice, NoticeLevel};
pub use store::{reduce, CommentPage, CommentStore};
pub use sync::{FetchGenerations, FetchTarget, Generation, SyncPolicy};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Issues comment commands against the remote API and folds every outcome
/// into one [`CommentStore`].
///
/// Commands never fail: each resolves to the event it settled with, and a
/// failure is also recorded in the store's last-error slot.
pub struct CommentsClient {
    api: Arc<dyn CommentApi>,
    policy: SyncPolicy,
    store: RwLock<CommentStore>,
    generations: Mutex<FetchGenerations>,
    events: broadcast::Sender<CommentEvent>,
}

impl CommentsClient {
    pub fn new(settings: &ClientSettings) -> Result<Arc<Self>> {
        let api = HttpCommentApi::new(&settings.api_base_url, settings.request_timeout())?;
        Ok(Self::with_api(Arc::new(api), settings.sync_policy()))
    }

    pub fn with_api(api: Arc<dyn CommentApi>, policy: SyncPolicy) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            api,
            policy,
            store: RwLock::new(CommentStore::new()),
            generations: Mutex::new(FetchGenerations::default()),
            events,
        })
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CommentEvent> {
        self.events.subscribe()
    }

    pub async fn create_comment(&self, answer_id: &AnswerId, draft: &CommentDraft) -> CommentEvent {
        info!(answer_id = %answer_id, "comments: creating comment");
        let event = match self.api.create_comment(answer_id, draft).await {
            Ok(comment) => CommentEvent::CommentCreated(comment),
            Err(err) => failed(
                CommentOperation::Create {
                    answer_id: answer_id.clone(),
                },
                &err,
            ),
        };
        let event = self.dispatch(event).await;

        if !event.is_failure() {
            if let Some(target) = self.policy.refetch_after_create(answer_id) {
                self.fetch(target.parent, target.request).await;
            }
        }
        event
    }

    pub async fn delete_comment(&self, comment_id: &CommentId) -> CommentEvent {
        let refetch = {
            let store = self.store.read().await;
            self.policy.refetch_after_delete(&store, comment_id)
        };
        info!(comment_id = %comment_id, "comments: deleting comment");
        let event = match self.api.delete_comment(comment_id).await {
            Ok(()) => CommentEvent::CommentDeleted(comment_id.clone()),
            Err(err) => failed(
                CommentOperation::Delete {
                    comment_id: comment_id.clone(),
                },
                &err,
            ),
        };
        let event = self.dispatch(event).await;

        if !event.is_failure() {
            if let Some(target) = refetch {
                self.fetch(target.parent, target.request).await;
            }
        }
        event
    }

    pub async fn fetch_comments_for_answer(
        &self,
        answer_id: &AnswerId,
        request: PageRequest,
    ) -> CommentEvent {
        self.fetch(ParentRef::Answer(answer_id.clone()), request)
            .await
    }

    pub async fn fetch_comments_for_question(
        &self,
        question_id: &QuestionId,
        request: PageRequest,
    ) -> CommentEvent {
        self.fetch(ParentRef::Question(question_id.clone()), request)
            .await
    }

    /// Fetches the first page for every answer that has neither been loaded
    /// nor has a fetch in flight. Outcomes come back in input order; answers
    /// that were skipped produce none.
    pub async fn load_missing_for_answers(&self, answer_ids: &[AnswerId]) -> Vec<CommentEvent> {
        let missing: Vec<ParentRef> = {
            let store = self.store.read().await;
            let generations = self.generations.lock().await;
            let mut missing: Vec<ParentRef> = Vec::new();
            for answer_id in answer_ids {
                let parent = ParentRef::Answer(answer_id.clone());
                if !store.is_loaded(&parent)
                    && !generations.is_in_flight(&parent)
                    && !missing.contains(&parent)
                {
                    missing.push(parent);
                }
            }
            missing
        };
        let request = self.policy.first_page();
        let fetches = missing.into_iter().map(|parent| self.fetch(parent, request));
        join_all(fetches).await
    }

    /// Folds a failure detected outside the command layer, such as a draft
    /// rejected before submission, into the error slot.
    pub async fn report_failure(
        &self,
        operation: CommentOperation,
        err: &CommentError,
    ) -> CommentEvent {
        self.dispatch(failed(operation, err)).await
    }

    pub async fn comments_for_answer(&self, answer_id: &AnswerId) -> Vec<Comment> {
        self.store.read().await.comments_for_answer(answer_id).to_vec()
    }

    pub async fn comments_for_question(&self, question_id: &QuestionId) -> Vec<Comment> {
        self.store
            .read()
            .await
            .comments_for_question(question_id)
            .to_vec()
    }

    pub async fn created_comments(&self) -> Vec<Comment> {
        self.store.read().await.created().to_vec()
    }

    pub async fn last_error(&self) -> Option<CommentFailure> {
        self.store.read().await.last_error().cloned()
    }

    pub async fn snapshot(&self) -> CommentStore {
        self.store.read().await.clone()
    }

    /// Empties the cache. Fetches still in flight are superseded, so none of
    /// them can repopulate the reset store.
    pub async fn reset(&self) {
        let mut store = self.store.write().await;
        self.generations.lock().await.invalidate_all();
        store.reset();
    }

    async fn fetch(&self, parent: ParentRef, request: PageRequest) -> CommentEvent {
        let generation = self.generations.lock().await.issue(&parent);
        info!(
            parent = %parent,
            page = request.page,
            size = request.page_size,
            generation = generation.0,
            "comments: fetching page"
        );

        let event = match self.api.list_comments(&parent, request).await {
            Ok(comments) => CommentEvent::CommentsLoaded {
                parent: parent.clone(),
                page: request.page,
                page_size: request.page_size,
                generation,
                comments,
            },
            Err(err) => failed(fetch_operation(&parent, request), &err),
        };

        self.generations.lock().await.settle(&parent);
        self.fold(event, Some((&parent, generation))).await
    }

    async fn dispatch(&self, event: CommentEvent) -> CommentEvent {
        self.fold(event, None).await
    }

    /// Applies `event` under the store write lock. A fetch outcome is checked
    /// against the latest generation while that lock is held, so nothing can
    /// supersede it between the check and the fold.
    async fn fold(
        &self,
        event: CommentEvent,
        fetched: Option<(&ParentRef, Generation)>,
    ) -> CommentEvent {
        let mut store = self.store.write().await;
        if let Some((parent, generation)) = fetched {
            if !self.generations.lock().await.is_current(parent, generation) {
                debug!(
                    parent = %parent,
                    generation = generation.0,
                    outcome = event.name(),
                    "comments: discarding superseded fetch outcome"
                );
                return event;
            }
        }
        if !store.apply(&event) {
            debug!(outcome = event.name(), "comments: store refused stale outcome");
            return event;
        }

        let notice = event.notice();
        match event.failure() {
            Some(failure) => warn!(
                operation = failure.operation.name(),
                kind = failure.kind.as_str(),
                status = failure.status,
                "comments: {} ({})",
                notice.text,
                failure.message
            ),
            None => debug!(outcome = event.name(), "comments: {}", notice.text),
        }
        // Sent under the write lock so subscribers observe fold order.
        let _ = self.events.send(event.clone());
        event
    }
}

fn failed(operation: CommentOperation, err: &CommentError) -> CommentEvent {
    CommentEvent::CommentOperationFailed(CommentFailure::new(operation, err))
}

fn fetch_operation(parent: &ParentRef, request: PageRequest) -> CommentOperation {
    match parent {
        ParentRef::Answer(answer_id) => CommentOperation::FetchForAnswer {
            answer_id: answer_id.clone(),
            page: request.page,
        },
        ParentRef::Question(question_id) => CommentOperation::FetchForQuestion {
            question_id: question_id.clone(),
            page: request.page,
        },
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
