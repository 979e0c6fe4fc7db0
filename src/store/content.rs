use std::sync::Arc;

use async_trait::async_trait;
use futures::{future, stream, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::app::{Result, StrandError};
use crate::domain::{jsonld, Actor, FollowedActor, Note, Record};
use crate::fetcher::Fetcher;
use crate::store::{ContentStore, NoteFilter, NoteStream, PageQuery, SqliteStore, Store};

pub const DEFAULT_MAX_OUTBOX_PAGES: usize = 2;

/// [`ContentStore`] backed by SQLite, falling back to the network on misses.
pub struct LocalContentStore {
    store: Arc<SqliteStore>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    max_outbox_pages: usize,
}

impl LocalContentStore {
    pub fn new(store: Arc<SqliteStore>, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_outbox_pages(store, fetcher, DEFAULT_MAX_OUTBOX_PAGES)
    }

    pub fn with_outbox_pages(
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        max_outbox_pages: usize,
    ) -> Self {
        Self {
            store,
            fetcher,
            max_outbox_pages,
        }
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    /// Walk an outbox collection, following `first`/`next` for at most
    /// `max_outbox_pages` hops.
    async fn collect_outbox(&self, outbox: &str) -> Result<Vec<Note>> {
        let mut notes = Vec::new();
        let mut current = self.fetcher.fetch_json(outbox).await?;
        let mut hops = 0;

        while let Some(page) = current.take() {
            notes.extend(notes_in_page(&page));

            if hops >= self.max_outbox_pages {
                break;
            }
            let Some(next) = page.get("first").or_else(|| page.get("next")) else {
                break;
            };
            hops += 1;

            current = match next {
                Value::Object(_) => Some(next.clone()),
                link => match jsonld::link_of(link) {
                    Some(url) => match self.fetcher.fetch_json(&url).await {
                        Ok(page) => page,
                        Err(e) => {
                            warn!("Stopping outbox walk at {}: {}", url, e);
                            None
                        }
                    },
                    None => None,
                },
            };
        }

        Ok(notes)
    }
}

/// Notes found in one collection page, whether listed bare or wrapped in activities.
fn notes_in_page(page: &Value) -> Vec<Note> {
    let items = page
        .get("orderedItems")
        .or_else(|| page.get("items"))
        .and_then(Value::as_array);

    let Some(items) = items else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match Record::from_value(item.clone()) {
            Ok(record) => {
                let actor = match &record {
                    Record::Activity(activity) => activity.actor.clone(),
                    Record::Note(_) => None,
                };
                let mut note = record.into_note()?;
                if note.attributed_to.is_none() {
                    note.attributed_to = actor;
                }
                Some(note)
            }
            Err(e) => {
                debug!("Skipping outbox item: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn get_note(&self, url: &str) -> Result<Option<Record>> {
        if let Some(note) = self.store.get_note(url)? {
            return Ok(Some(Record::Note(note)));
        }

        let Some(value) = self.fetcher.fetch_json(url).await? else {
            return Ok(None);
        };
        let record = Record::from_value(value)?;
        if let Record::Note(note) = &record {
            self.store.put_note(note)?;
        }
        Ok(Some(record))
    }

    async fn get_actor(&self, url: &str) -> Result<Option<Actor>> {
        if let Some(actor) = self.store.get_actor(url)? {
            return Ok(Some(actor));
        }

        let Some(value) = self.fetcher.fetch_json(url).await? else {
            return Ok(None);
        };
        let actor: Actor = serde_json::from_value(value)
            .map_err(|e| StrandError::MalformedRecord(format!("actor {}: {}", url, e)))?;
        self.store.put_actor(&actor)?;
        Ok(Some(actor))
    }

    fn search_notes(&self, filter: NoteFilter, query: PageQuery) -> NoteStream<'_> {
        stream::once(async move { self.store.search_notes(&filter, &query) })
            .flat_map(|page| match page {
                Ok(notes) => stream::iter(notes.into_iter().map(Ok)).left_stream(),
                Err(e) => stream::once(future::ready(Err(e))).right_stream(),
            })
            .boxed()
    }

    async fn get_followed_actors(&self) -> Result<Vec<FollowedActor>> {
        self.store.followed_actors()
    }

    async fn follow_actor(&self, url: &str) -> Result<bool> {
        self.store.follow(url)
    }

    async fn unfollow_actor(&self, url: &str) -> Result<bool> {
        self.store.unfollow(url)
    }

    async fn ingest_actor(&self, url: &str) -> Result<usize> {
        let value = self
            .fetcher
            .fetch_json(url)
            .await?
            .ok_or_else(|| StrandError::NotFound(url.to_string()))?;
        let actor: Actor = serde_json::from_value(value)
            .map_err(|e| StrandError::MalformedRecord(format!("actor {}: {}", url, e)))?;

        self.store.put_actor(&actor)?;
        if actor.id != url {
            self.store.link_followed(url, &actor.id)?;
        }

        let Some(outbox) = actor.outbox.as_deref() else {
            debug!("Actor {} has no outbox", url);
            return Ok(0);
        };

        let notes = self.collect_outbox(outbox).await?;
        let count = self.store.put_notes(&notes)?;
        info!("Ingested {} notes from {}", count, url);

        Ok(count)
    }

    async fn get_total_notes_count(&self) -> Result<u64> {
        self.store.count_notes()
    }
}
