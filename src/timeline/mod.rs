//! The following timeline as a view sees it.
//!
//! [`Timeline`] glues pagination, rendering and link verification together
//! and turns [`ViewIntent`]s from the view layer into controller calls.

pub mod pagination;
pub mod view;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::app::Result;
use crate::domain::Sort;
use crate::ingest::IngestionCoordinator;
use crate::render::{FeedItem, PostRenderer};
use crate::resolver::{Verification, VerificationSet};

pub use pagination::{
    Page, PageCounts, PaginationController, PaginationState, SkipPolicy, DEFAULT_PAGE_LIMIT,
};
pub use view::{ViewIntent, ViewOptions};

pub struct Timeline {
    controller: PaginationController,
    renderer: PostRenderer,
    coordinator: Arc<IngestionCoordinator>,
    /// Options the page was opened with. The sort lives in the controller.
    options: ViewOptions,
    items: Vec<FeedItem>,
    verifications: Vec<VerificationSet>,
    /// Parent of every verification token; cancelled on teardown.
    token: CancellationToken,
}

impl Timeline {
    pub fn new(
        controller: PaginationController,
        renderer: PostRenderer,
        coordinator: Arc<IngestionCoordinator>,
    ) -> Self {
        Self {
            controller,
            renderer,
            coordinator,
            options: ViewOptions::default(),
            items: Vec::new(),
            verifications: Vec::new(),
            token: CancellationToken::new(),
        }
    }

    /// Carry the remaining view options; the sort is taken from the controller.
    pub fn with_options(mut self, options: ViewOptions) -> Self {
        self.options = options;
        self
    }

    /// Wait for ingestion, then load the first page in the current sort.
    pub async fn open(&mut self) -> Result<usize> {
        self.coordinator.ensure_ready().await?;
        let sort = self.controller.sort();
        self.reset(sort).await
    }

    /// Returns how many items were appended. Toggling appends nothing.
    pub async fn apply(&mut self, intent: ViewIntent) -> Result<usize> {
        match intent {
            ViewIntent::RequestMore => self.load_more().await,
            ViewIntent::ToggleDisclosure(id) => {
                if !self.toggle_disclosure(&id) {
                    debug!("No rendered post {} to toggle", id);
                }
                Ok(0)
            }
            ViewIntent::ChangeSort(sort) => self.reset(sort).await,
        }
    }

    pub async fn load_more(&mut self) -> Result<usize> {
        if !self.controller.has_more_items() {
            return Ok(0);
        }
        let page = self.controller.load_more().await?;
        Ok(self.append(page))
    }

    /// Rendered items survive until the new session has been committed.
    async fn reset(&mut self, sort: Sort) -> Result<usize> {
        self.controller.restart(sort).await?;
        self.clear();
        let page = self.controller.load_more().await?;
        Ok(self.append(page))
    }

    fn append(&mut self, page: Page) -> usize {
        let appended = page.notes.len();
        for note in &page.notes {
            let item = self.renderer.item(note);
            if let Some(post) = item.as_post() {
                let set = self.renderer.verify_links(post, self.token.child_token());
                if !set.is_empty() {
                    self.verifications.push(set);
                }
            }
            self.items.push(item);
        }
        appended
    }

    /// Items and checks from the previous session are discarded.
    fn clear(&mut self) {
        self.items.clear();
        self.verifications.clear();
    }

    /// Returns false when no rendered post has this id.
    pub fn toggle_disclosure(&mut self, id: &str) -> bool {
        let post = self
            .items
            .iter_mut()
            .filter_map(FeedItem::as_post_mut)
            .find(|post| post.note.id == id);

        match post {
            Some(post) => {
                post.note.disclosure.toggle();
                true
            }
            None => false,
        }
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn state(&self) -> &PaginationState {
        self.controller.state()
    }

    pub fn options(&self) -> ViewOptions {
        ViewOptions {
            sort: self.controller.sort(),
            ..self.options
        }
    }

    pub fn pending_verifications(&self) -> usize {
        self.verifications.iter().map(VerificationSet::len).sum()
    }

    /// Wait for every outstanding link check.
    pub async fn settle(&mut self) -> Vec<Verification> {
        let mut done = Vec::new();
        for set in self.verifications.drain(..) {
            done.extend(set.finish().await);
        }
        done
    }

    /// Cancel outstanding link checks. Already rewritten links are kept.
    pub fn teardown(&mut self) {
        debug!(
            "Timeline teardown with {} pending link checks",
            self.pending_verifications()
        );
        self.token.cancel();
        self.verifications.clear();
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
