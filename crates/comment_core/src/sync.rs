//! Rules for keeping the cache in step with the server after each command.

use std::collections::HashMap;

use shared::{
    domain::{AnswerId, CommentId, ParentRef},
    protocol::{PageRequest, DEFAULT_PAGE_SIZE},
};

use crate::store::CommentStore;

/// Per-parent request counter. Only the outcome of the most recently issued
/// fetch for a key may reach the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

#[derive(Debug, Default)]
pub struct FetchGenerations {
    latest: HashMap<ParentRef, Generation>,
    in_flight: HashMap<ParentRef, usize>,
}

impl FetchGenerations {
    pub fn issue(&mut self, parent: &ParentRef) -> Generation {
        let next = self
            .latest
            .get(parent)
            .map(|generation| Generation(generation.0 + 1))
            .unwrap_or(Generation(1));
        self.latest.insert(parent.clone(), next);
        *self.in_flight.entry(parent.clone()).or_default() += 1;
        next
    }

    pub fn settle(&mut self, parent: &ParentRef) {
        if let Some(count) = self.in_flight.get_mut(parent) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(parent);
            }
        }
    }

    pub fn is_current(&self, parent: &ParentRef, generation: Generation) -> bool {
        self.latest.get(parent) == Some(&generation)
    }

    pub fn is_in_flight(&self, parent: &ParentRef) -> bool {
        self.in_flight.contains_key(parent)
    }

    /// Supersedes every fetch still in flight. Their outcomes will no longer
    /// be current when they settle.
    pub fn invalidate_all(&mut self) {
        for parent in self.in_flight.keys() {
            if let Some(latest) = self.latest.get_mut(parent) {
                latest.0 += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    pub page_size: u32,
    pub refetch_after_mutation: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            refetch_after_mutation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub parent: ParentRef,
    pub request: PageRequest,
}

impl SyncPolicy {
    pub fn without_refetch(self) -> Self {
        Self {
            refetch_after_mutation: false,
            ..self
        }
    }

    pub fn first_page(&self) -> PageRequest {
        PageRequest::first(self.page_size)
    }

    pub fn refetch_after_create(&self, answer_id: &AnswerId) -> Option<FetchTarget> {
        self.refetch_after_mutation.then(|| FetchTarget {
            parent: ParentRef::Answer(answer_id.clone()),
            request: self.first_page(),
        })
    }

    /// Must be resolved before the delete is sent: once the page is
    /// re-fetched the comment can no longer be located.
    pub fn refetch_after_delete(
        &self,
        store: &CommentStore,
        comment_id: &CommentId,
    ) -> Option<FetchTarget> {
        if !self.refetch_after_mutation {
            return None;
        }
        let (parent, page) = store.locate(comment_id)?;
        Some(FetchTarget {
            parent: parent.clone(),
            request: PageRequest::new(page.page, page.page_size),
        })
    }
}
