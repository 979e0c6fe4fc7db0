pub mod content;
pub mod sqlite;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::app::Result;
use crate::domain::{Actor, FollowedActor, Note, Record, Sort};

pub use content::LocalContentStore;
pub use sqlite::SqliteStore;

/// Which notes a search covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteFilter {
    /// Notes authored by followed actors.
    Following,
    /// Notes replying to the given note id.
    Replies(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub skip: usize,
    pub limit: usize,
    pub sort: Sort,
}

/// Finite, lazily produced page of notes.
pub type NoteStream<'a> = BoxStream<'a, Result<Note>>;

/// Synchronous persistence for notes, actors and the follow list.
pub trait Store {
    // Note operations
    fn put_note(&self, note: &Note) -> Result<()>;
    fn put_notes(&self, notes: &[Note]) -> Result<usize>;
    fn get_note(&self, id: &str) -> Result<Option<Note>>;
    fn search_notes(&self, filter: &NoteFilter, query: &PageQuery) -> Result<Vec<Note>>;
    fn count_notes(&self) -> Result<u64>;

    // Actor operations
    fn put_actor(&self, actor: &Actor) -> Result<()>;
    fn get_actor(&self, id: &str) -> Result<Option<Actor>>;

    // Follow list
    fn follow(&self, url: &str) -> Result<bool>;
    fn unfollow(&self, url: &str) -> Result<bool>;
    fn link_followed(&self, url: &str, actor_id: &str) -> Result<()>;
    fn followed_actors(&self) -> Result<Vec<FollowedActor>>;
}

/// The content store as the timeline and post views consume it.
///
/// Every call may suspend; lookups that miss locally may reach the network.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// `Ok(None)` when the object does not exist, `Err` when it could not be reached.
    async fn get_note(&self, url: &str) -> Result<Option<Record>>;
    async fn get_actor(&self, url: &str) -> Result<Option<Actor>>;
    fn search_notes(&self, filter: NoteFilter, query: PageQuery) -> NoteStream<'_>;
    async fn get_followed_actors(&self) -> Result<Vec<FollowedActor>>;
    async fn follow_actor(&self, url: &str) -> Result<bool>;
    async fn unfollow_actor(&self, url: &str) -> Result<bool>;
    /// Pull an actor and its outbox into the store, returning the number of notes stored.
    async fn ingest_actor(&self, url: &str) -> Result<usize>;
    async fn get_total_notes_count(&self) -> Result<u64>;

    /// Canonical page for a note, used to build permalinks.
    fn get_object_page(&self, note: &Note) -> String {
        note.url.clone().unwrap_or_else(|| note.id.clone())
    }
}
