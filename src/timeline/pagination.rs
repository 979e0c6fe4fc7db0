//! Feed position and sort state, advanced one store page at a time.

use std::sync::Arc;

use futures::TryStreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::app::Result;
use crate::domain::{Note, Sort};
use crate::store::{ContentStore, NoteFilter, PageQuery};

pub const DEFAULT_PAGE_LIMIT: usize = 32;

/// Which count drives the page bookkeeping once replies are filtered out.
///
/// `Emitted` advances by the notes actually shown. On a reply-heavy feed
/// this re-reads the same rows, and under `latest` ends pagination early
/// after a short page. `Returned` advances by everything the store
/// yielded instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipPolicy {
    #[default]
    Emitted,
    Returned,
}

impl SkipPolicy {
    pub fn counted(&self, counts: PageCounts) -> usize {
        match self {
            SkipPolicy::Emitted => counts.emitted,
            SkipPolicy::Returned => counts.returned,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCounts {
    /// Notes the store yielded for the page.
    pub returned: usize,
    /// Of those, notes that are not replies.
    pub emitted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub skip: usize,
    pub limit: usize,
    pub sort: Sort,
    pub has_more_items: bool,
    pub loaded_count: usize,
    pub total_count: u64,
}

impl PaginationState {
    pub fn new(limit: usize, sort: Sort) -> Self {
        Self {
            skip: 0,
            limit: limit.max(1),
            sort,
            has_more_items: true,
            loaded_count: 0,
            total_count: 0,
        }
    }

    /// Start of a fresh session for `sort`.
    pub fn restarted(&self, sort: Sort, total_count: u64) -> Self {
        Self {
            total_count,
            ..Self::new(self.limit, sort)
        }
    }

    /// State after a page with `counts` has been consumed.
    pub fn advanced(&self, counts: PageCounts, policy: SkipPolicy) -> Self {
        let counted = policy.counted(counts);
        let mut next = self.clone();
        next.skip += counted;

        match self.sort {
            Sort::Random => {
                next.loaded_count += counted;
                next.has_more_items = (next.loaded_count as u64) < next.total_count;
            }
            Sort::Latest => next.has_more_items = counted == self.limit,
            Sort::Oldest => next.has_more_items = counted > 0,
        }

        next
    }
}

/// One consumed page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Non-reply notes, in store order.
    pub notes: Vec<Note>,
    pub counts: PageCounts,
}

/// Drives incremental loading of one timeline.
///
/// Methods that touch the store take `&mut self`, so a controller can never
/// have two loads in flight.
pub struct PaginationController {
    store: Arc<dyn ContentStore>,
    policy: SkipPolicy,
    state: PaginationState,
}

impl PaginationController {
    pub fn new(store: Arc<dyn ContentStore>, limit: usize, sort: Sort) -> Self {
        Self {
            store,
            policy: SkipPolicy::default(),
            state: PaginationState::new(limit, sort),
        }
    }

    pub fn with_policy(mut self, policy: SkipPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn sort(&self) -> Sort {
        self.state.sort
    }

    pub fn has_more_items(&self) -> bool {
        self.state.has_more_items
    }

    /// Back to the first page under `sort`, then load it.
    ///
    /// On error the state keeps whatever had been committed: the previous
    /// session if the count could not be read, the fresh session if the
    /// first page could not.
    pub async fn reset(&mut self, sort: Sort) -> Result<Page> {
        self.restart(sort).await?;
        self.load_more().await
    }

    /// Commit a fresh session under `sort` without loading anything.
    ///
    /// The previous session is kept if the note count cannot be read.
    pub async fn restart(&mut self, sort: Sort) -> Result<()> {
        let total = self.store.get_total_notes_count().await?;
        self.state = self.state.restarted(sort, total);
        debug!("Timeline reset: sort={}, total={}", sort, total);
        Ok(())
    }

    /// Fetch and fully consume the next page. State only changes on success.
    pub async fn load_more(&mut self) -> Result<Page> {
        let query = PageQuery {
            skip: self.state.skip,
            limit: self.state.limit,
            sort: self.state.sort,
        };

        let store = self.store.clone();
        let mut stream = store.search_notes(NoteFilter::Following, query);
        let mut notes = Vec::new();
        let mut returned = 0;

        while let Some(note) = stream.try_next().await? {
            returned += 1;
            if note.is_reply() {
                debug!("Skipping reply {}", note.id);
                continue;
            }
            notes.push(note);
        }

        let counts = PageCounts {
            returned,
            emitted: notes.len(),
        };
        self.state = self.state.advanced(counts, self.policy);
        debug!(
            "Loaded page: returned={}, emitted={}, skip={}, has_more={}",
            counts.returned, counts.emitted, self.state.skip, self.state.has_more_items
        );

        Ok(Page { notes, counts })
    }
}
