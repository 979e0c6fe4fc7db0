//! In-memory [`ContentStore`] for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::{stream, StreamExt};

use crate::app::{Result, StrandError};
use crate::domain::{Actor, FollowedActor, Note, Record};
use crate::store::{ContentStore, NoteFilter, NoteStream, PageQuery};

#[derive(Default)]
pub struct MemoryStore {
    /// Timeline notes in the order searches return them.
    pub notes: Mutex<Vec<Note>>,
    /// Documents served by `get_note` that are not timeline notes.
    pub records: Mutex<HashMap<String, Record>>,
    pub actors: Mutex<HashMap<String, Actor>>,
    pub followed: Mutex<Vec<String>>,
    /// Overrides the note count reported to pagination.
    pub total: Mutex<Option<u64>>,
    /// URLs whose lookups or ingestion fail with a transport error.
    pub unreachable: Mutex<HashSet<String>>,
    pub search_fails: Mutex<bool>,
    /// Number of notes a search yields before failing.
    pub fail_after: Mutex<Option<usize>>,
    pub count_fails: Mutex<bool>,
    pub queries: Mutex<Vec<PageQuery>>,
    pub ingested: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn with_notes(notes: Vec<Note>) -> Self {
        let store = Self::default();
        *store.notes.lock().unwrap() = notes;
        store
    }

    pub fn note(id: &str) -> Note {
        let mut note = Note::new(id);
        note.content = Some(format!("<p>{}</p>", id));
        note.attributed_to = Some("https://a.example/@alice".into());
        note
    }

    pub fn reply(id: &str, parent: &str) -> Note {
        let mut note = Self::note(id);
        note.in_reply_to = Some(parent.into());
        note
    }

    pub fn numbered(prefix: &str, count: usize) -> Vec<Note> {
        (0..count)
            .map(|i| Self::note(&format!("https://a.example/{}/{}", prefix, i)))
            .collect()
    }

    fn check_reachable(&self, url: &str) -> Result<()> {
        if self.unreachable.lock().unwrap().contains(url) {
            return Err(StrandError::Transport(format!("{} is unreachable", url)));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_note(&self, url: &str) -> Result<Option<Record>> {
        self.check_reachable(url)?;
        if let Some(record) = self.records.lock().unwrap().get(url) {
            return Ok(Some(record.clone()));
        }
        Ok(self
            .notes
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == url)
            .cloned()
            .map(Record::Note))
    }

    async fn get_actor(&self, url: &str) -> Result<Option<Actor>> {
        self.check_reachable(url)?;
        Ok(self.actors.lock().unwrap().get(url).cloned())
    }

    fn search_notes(&self, filter: NoteFilter, query: PageQuery) -> NoteStream<'_> {
        self.queries.lock().unwrap().push(query);

        if *self.search_fails.lock().unwrap() {
            return stream::iter(vec![Err(StrandError::Transport("store offline".into()))]).boxed();
        }

        let page: Vec<Note> = self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|note| match &filter {
                NoteFilter::Following => true,
                NoteFilter::Replies(parent) => note.in_reply_to.as_deref() == Some(parent.as_str()),
            })
            .skip(query.skip)
            .take(query.limit)
            .cloned()
            .collect();

        let mut items: Vec<Result<Note>> = page.into_iter().map(Ok).collect();
        if let Some(n) = *self.fail_after.lock().unwrap() {
            items.truncate(n);
            items.push(Err(StrandError::Transport("connection reset".into())));
        }
        stream::iter(items).boxed()
    }

    async fn get_followed_actors(&self) -> Result<Vec<FollowedActor>> {
        Ok(self
            .followed
            .lock()
            .unwrap()
            .iter()
            .map(|url| FollowedActor { url: url.clone() })
            .collect())
    }

    async fn follow_actor(&self, url: &str) -> Result<bool> {
        let mut followed = self.followed.lock().unwrap();
        if followed.iter().any(|u| u == url) {
            return Ok(false);
        }
        followed.push(url.to_string());
        Ok(true)
    }

    async fn unfollow_actor(&self, url: &str) -> Result<bool> {
        let mut followed = self.followed.lock().unwrap();
        let before = followed.len();
        followed.retain(|u| u != url);
        Ok(followed.len() != before)
    }

    async fn ingest_actor(&self, url: &str) -> Result<usize> {
        tokio::task::yield_now().await;
        self.ingested.lock().unwrap().push(url.to_string());
        self.check_reachable(url)?;
        Ok(1)
    }

    async fn get_total_notes_count(&self) -> Result<u64> {
        if *self.count_fails.lock().unwrap() {
            return Err(StrandError::Transport("store offline".into()));
        }
        if let Some(total) = *self.total.lock().unwrap() {
            return Ok(total);
        }
        Ok(self.notes.lock().unwrap().len() as u64)
    }
}
