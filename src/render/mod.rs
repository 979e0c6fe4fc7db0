//! Single-post rendering: permalinks, dates, author cards and the reply thread.
//!
//! Failures never leave this module as errors. A post that cannot be loaded
//! becomes a [`FeedItem::Error`] in its own slot so neighbouring posts are
//! unaffected.

pub mod time;

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures::TryStreamExt;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::app::{Result, StrandError};
use crate::domain::{Actor, Note, Record, Sort};
use crate::normalizer::{ContentNormalizer, DisclosureMode, MediaKind, NormalizedNote};
use crate::resolver::{post_route, profile_route, LinkResolver, VerificationSet};
use crate::store::{ContentStore, NoteFilter, PageQuery};
use crate::timeline::ViewOptions;

pub use time::{format_date, time_since};

/// Most replies shown under a single post.
pub const REPLY_LIMIT: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPost {
    pub note: NormalizedNote,
    /// Header link, built from the note's canonical page.
    pub permalink: String,
    /// Footer link, built from the note id.
    pub full_date_link: String,
    pub relative_time: Option<String>,
    pub full_date: Option<String>,
    /// Direct replies, capped at [`REPLY_LIMIT`]. `None` until counted.
    pub reply_count: Option<usize>,
    /// Filled only for `view=replies`.
    pub replies: Vec<FeedItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Post(Box<RenderedPost>),
    Error { url: String, message: String },
}

impl FeedItem {
    pub fn error(url: &str, message: impl Into<String>) -> Self {
        FeedItem::Error {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FeedItem::Post(post) => &post.note.id,
            FeedItem::Error { url, .. } => url,
        }
    }

    pub fn as_post(&self) -> Option<&RenderedPost> {
        match self {
            FeedItem::Post(post) => Some(post.as_ref()),
            FeedItem::Error { .. } => None,
        }
    }

    pub fn as_post_mut(&mut self) -> Option<&mut RenderedPost> {
        match self {
            FeedItem::Post(post) => Some(post.as_mut()),
            FeedItem::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FeedItem::Error { .. })
    }
}

/// Terminal rendering.
impl fmt::Display for FeedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedItem::Error { url, message } => write!(f, "[error] {}: {}", url, message),
            FeedItem::Post(post) => write_post(f, post, 0),
        }
    }
}

fn write_post(f: &mut fmt::Formatter<'_>, post: &RenderedPost, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    let note = &post.note;

    write!(f, "{}{}", indent, note.attributed_to.as_deref().unwrap_or("unknown"))?;
    if let Some(relative) = &post.relative_time {
        write!(f, " · {}", relative)?;
    }
    writeln!(f)?;

    let disclosure = &note.disclosure;
    if disclosure.mode != DisclosureMode::None {
        write!(f, "{}[{}]", indent, disclosure.label)?;
        if let Some(toggle) = disclosure.toggle_text() {
            write!(f, " ({})", toggle)?;
        }
        writeln!(f)?;
    }

    if !disclosure.is_collapsed() {
        for line in note.content.plain_text().lines() {
            writeln!(f, "{}{}", indent, line)?;
        }
        for media in &note.gallery {
            let kind = match media.kind {
                MediaKind::Image => "image",
                MediaKind::Video => "video",
            };
            writeln!(
                f,
                "{}[{}: {}] {}",
                indent,
                kind,
                media.src,
                media.alt.as_deref().unwrap_or_default()
            )?;
        }
    }

    write!(f, "{}{}", indent, post.permalink)?;
    if let Some(date) = &post.full_date {
        write!(f, " · {}", date)?;
    }
    if let Some(count) = post.reply_count {
        write!(f, " · {} replies", count)?;
    }

    for reply in &post.replies {
        writeln!(f)?;
        match reply {
            FeedItem::Post(reply) => write_post(f, reply, depth + 1)?,
            error => write!(f, "{}  {}", indent, error)?,
        }
    }
    Ok(())
}

/// Author header for a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorCard {
    pub id: String,
    pub name: Option<String>,
    pub handle: Option<String>,
    pub icon_url: String,
    pub profile_link: String,
}

impl ActorCard {
    pub fn from_actor(actor: &Actor) -> Self {
        Self {
            id: actor.id.clone(),
            name: actor.display_name().map(String::from),
            handle: actor.handle(),
            icon_url: actor.icon_url().to_string(),
            profile_link: profile_route(&actor.id),
        }
    }
}

/// Loads and renders posts against a content store.
#[derive(Clone)]
pub struct PostRenderer {
    store: Arc<dyn ContentStore>,
    normalizer: ContentNormalizer,
    resolver: LinkResolver,
}

impl PostRenderer {
    pub fn new(store: Arc<dyn ContentStore>, normalizer: ContentNormalizer) -> Self {
        Self {
            resolver: LinkResolver::new(store.clone()),
            store,
            normalizer,
        }
    }

    /// A note that came out of a timeline search.
    pub fn render_note(&self, note: &Note) -> Result<RenderedPost> {
        let normalized = self.normalizer.normalize_note(note)?;
        Ok(self.decorate(note, normalized))
    }

    /// A record fetched by URL. Activities are refused.
    pub fn render_record(&self, record: &Record) -> Result<RenderedPost> {
        let normalized = self.normalizer.normalize(record)?;
        let note = record.as_note().ok_or(StrandError::Discrimination)?;
        Ok(self.decorate(note, normalized))
    }

    fn decorate(&self, note: &Note, normalized: NormalizedNote) -> RenderedPost {
        let now = Utc::now();
        RenderedPost {
            permalink: post_route(&self.store.get_object_page(note)),
            full_date_link: post_route(&note.id),
            relative_time: note.published.map(|date| time_since(date, now)),
            full_date: note.published.map(format_date),
            note: normalized,
            reply_count: None,
            replies: Vec::new(),
        }
    }

    /// Single-post entry point.
    pub async fn load(&self, url: &str, options: &ViewOptions) -> FeedItem {
        if url.is_empty() {
            return FeedItem::error(url, "No post URL provided");
        }

        match self.load_post(url, options).await {
            Ok(post) => FeedItem::Post(Box::new(post)),
            Err(e) => {
                error!("Failed to render post {}: {}", url, e);
                FeedItem::error(url, e.to_string())
            }
        }
    }

    async fn load_post(&self, url: &str, options: &ViewOptions) -> Result<RenderedPost> {
        let record = self
            .store
            .get_note(url)
            .await?
            .ok_or_else(|| StrandError::NotFound(url.to_string()))?;

        let mut post = self.render_record(&record)?;

        // A thread that cannot be read leaves the post itself intact.
        match self.reply_notes(&post.note.id).await {
            Ok(notes) => {
                post.reply_count = Some(notes.len());
                if options.show_replies {
                    post.replies = notes.iter().map(|note| self.item(note)).collect();
                }
            }
            Err(e) => {
                error!("Failed to load replies to {}: {}", post.note.id, e);
                if options.show_replies {
                    post.replies.push(FeedItem::error(&post.note.id, e.to_string()));
                }
            }
        }
        Ok(post)
    }

    /// Direct replies, oldest first. Each reply renders or fails on its own.
    pub async fn replies(&self, id: &str) -> Result<Vec<FeedItem>> {
        let notes = self.reply_notes(id).await?;
        Ok(notes.iter().map(|note| self.item(note)).collect())
    }

    async fn reply_notes(&self, id: &str) -> Result<Vec<Note>> {
        let query = PageQuery {
            skip: 0,
            limit: REPLY_LIMIT,
            sort: Sort::Oldest,
        };
        self.store
            .search_notes(NoteFilter::Replies(id.to_string()), query)
            .try_collect()
            .await
    }

    /// Render a note into its feed slot.
    pub fn item(&self, note: &Note) -> FeedItem {
        match self.render_note(note) {
            Ok(post) => FeedItem::Post(Box::new(post)),
            Err(e) => {
                error!("Failed to render note {}: {}", note.id, e);
                FeedItem::error(&note.id, e.to_string())
            }
        }
    }

    /// Start background checks for every actor/post link in `post`.
    pub fn verify_links(&self, post: &RenderedPost, token: CancellationToken) -> VerificationSet {
        self.resolver.verify_all(post.note.content.links(), token)
    }

    pub async fn actor_card(&self, url: &str) -> Result<Option<ActorCard>> {
        Ok(self
            .store
            .get_actor(url)
            .await?
            .map(|actor| ActorCard::from_actor(&actor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Activity, ActivityObject, Image, DEFAULT_ICON};
    use crate::resolver::{LinkKind, VerifyOutcome};
    use crate::testing::MemoryStore;
    use chrono::{Duration, TimeZone};

    const POST: &str = "https://a.example/notes/1";

    fn renderer(store: &Arc<MemoryStore>) -> PostRenderer {
        PostRenderer::new(store.clone(), ContentNormalizer::default())
    }

    fn options(show_replies: bool) -> ViewOptions {
        ViewOptions {
            sort: Sort::Latest,
            show_replies,
        }
    }

    #[tokio::test]
    async fn test_transport_error_becomes_placeholder() {
        let store = Arc::new(MemoryStore::with_notes(vec![
            MemoryStore::note(POST),
            MemoryStore::note("https://a.example/notes/2"),
        ]));
        store.unreachable.lock().unwrap().insert(POST.to_string());
        let renderer = renderer(&store);

        let broken = renderer.load(POST, &options(false)).await;
        assert_eq!(
            broken,
            FeedItem::error(POST, "Transport error: https://a.example/notes/1 is unreachable")
        );

        let sibling = renderer.load("https://a.example/notes/2", &options(false)).await;
        assert!(sibling.as_post().is_some());
    }

    #[tokio::test]
    async fn test_missing_and_empty_urls() {
        let store = Arc::new(MemoryStore::default());
        let renderer = renderer(&store);

        let item = renderer.load("", &options(false)).await;
        assert_eq!(item, FeedItem::error("", "No post URL provided"));

        let item = renderer.load(POST, &options(false)).await;
        assert_eq!(item, FeedItem::error(POST, format!("Not found: {}", POST)));
    }

    #[tokio::test]
    async fn test_activity_rejected_at_single_post_entry() {
        let store = Arc::new(MemoryStore::default());
        let mut activity = Activity::new("https://a.example/activities/1");
        activity.object = ActivityObject::Note(Box::new(MemoryStore::note(POST)));
        store
            .records
            .lock()
            .unwrap()
            .insert(activity.id.clone(), Record::Activity(activity));

        let item = renderer(&store)
            .load("https://a.example/activities/1", &options(false))
            .await;
        assert_eq!(
            item,
            FeedItem::error(
                "https://a.example/activities/1",
                "Expected a Note but received an Activity"
            )
        );
    }

    #[test]
    fn test_links_and_dates() {
        let store = Arc::new(MemoryStore::default());
        let mut note = MemoryStore::note(POST);
        note.url = Some("https://a.example/@alice/1".into());
        note.published = Some(Utc::now() - Duration::hours(3));

        let post = renderer(&store).render_note(&note).unwrap();
        assert_eq!(
            post.permalink,
            "/post.html?url=https%3A%2F%2Fa.example%2F%40alice%2F1"
        );
        assert_eq!(
            post.full_date_link,
            "/post.html?url=https%3A%2F%2Fa.example%2Fnotes%2F1"
        );
        assert_eq!(post.relative_time.as_deref(), Some("3h"));
        assert!(post.full_date.is_some());
    }

    #[test]
    fn test_note_without_date() {
        let store = Arc::new(MemoryStore::default());
        let post = renderer(&store).render_note(&MemoryStore::note(POST)).unwrap();
        assert_eq!(post.relative_time, None);
        assert_eq!(post.full_date, None);
    }

    #[tokio::test]
    async fn test_replies_view() {
        let mut malformed = MemoryStore::reply("https://a.example/notes/4", POST);
        malformed.content = None;
        let store = Arc::new(MemoryStore::with_notes(vec![
            MemoryStore::note(POST),
            MemoryStore::reply("https://a.example/notes/2", POST),
            MemoryStore::reply("https://a.example/notes/3", "https://a.example/notes/9"),
            malformed,
        ]));
        let renderer = renderer(&store);

        let item = renderer.load(POST, &options(false)).await;
        let post = item.as_post().unwrap();
        assert!(post.replies.is_empty());
        assert_eq!(post.reply_count, Some(2));

        let item = renderer.load(POST, &options(true)).await;
        let replies = &item.as_post().unwrap().replies;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].url(), "https://a.example/notes/2");
        assert!(!replies[0].is_error());
        assert!(replies[1].is_error());

        let query = store.queries.lock().unwrap()[0];
        assert_eq!(query.sort, Sort::Oldest);
    }

    #[tokio::test]
    async fn test_unreadable_thread_keeps_post() {
        let store = Arc::new(MemoryStore::with_notes(vec![
            MemoryStore::note(POST),
            MemoryStore::reply("https://a.example/notes/2", POST),
        ]));
        *store.search_fails.lock().unwrap() = true;
        let renderer = renderer(&store);

        let item = renderer.load(POST, &options(true)).await;
        assert!(!item.is_error());
        let post = item.as_post().unwrap();
        assert_eq!(post.note.id, POST);
        assert_eq!(post.reply_count, None);
        assert_eq!(post.replies.len(), 1);
        assert!(post.replies[0].is_error());

        let item = renderer.load(POST, &options(false)).await;
        let post = item.as_post().unwrap();
        assert!(post.replies.is_empty());
        assert_eq!(post.reply_count, None);
    }

    #[tokio::test]
    async fn test_reply_count_shown() {
        let store = Arc::new(MemoryStore::with_notes(vec![
            MemoryStore::note(POST),
            MemoryStore::reply("https://a.example/notes/2", POST),
            MemoryStore::reply("https://a.example/notes/3", POST),
            MemoryStore::reply("https://a.example/notes/4", "https://a.example/notes/2"),
        ]));

        let item = renderer(&store).load(POST, &options(false)).await;
        assert_eq!(item.as_post().unwrap().reply_count, Some(2));
        assert!(item.to_string().contains(" · 2 replies"));

        let timeline_item = renderer(&store).item(&MemoryStore::note(POST));
        assert_eq!(timeline_item.as_post().unwrap().reply_count, None);
    }

    #[tokio::test]
    async fn test_actor_card() {
        let store = Arc::new(MemoryStore::default());
        let mut actor = Actor::new("https://a.example/@alice");
        actor.name = Some("Alice".into());
        actor.preferred_username = Some("alice".into());
        actor.icon = vec![Image {
            url: Some("https://a.example/alice.png".into()),
        }];
        store.actors.lock().unwrap().insert(actor.id.clone(), actor);
        let renderer = renderer(&store);

        let card = renderer
            .actor_card("https://a.example/@alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(card.name.as_deref(), Some("Alice"));
        assert_eq!(card.handle.as_deref(), Some("@alice"));
        assert_eq!(card.icon_url, "https://a.example/alice.png");
        assert_eq!(
            card.profile_link,
            "/profile.html?actor=https%3A%2F%2Fa.example%2F%40alice"
        );

        assert!(renderer.actor_card("https://b.example/@bob").await.unwrap().is_none());
        let bare = ActorCard::from_actor(&Actor::new("https://b.example/@bob"));
        assert_eq!(bare.icon_url, DEFAULT_ICON);
    }

    #[tokio::test]
    async fn test_verify_links_skips_external() {
        let store = Arc::new(MemoryStore::default());
        store
            .actors
            .lock()
            .unwrap()
            .insert("https://b.example/@bob".into(), Actor::new("https://b.example/@bob"));
        let mut note = MemoryStore::note(POST);
        note.content = Some(
            r#"<p><a href="https://b.example/@bob">@bob</a> <a href="https://elsewhere.example/">x</a></p>"#
                .into(),
        );
        let renderer = renderer(&store);
        let post = renderer.render_note(&note).unwrap();

        let done = renderer
            .verify_links(&post, CancellationToken::new())
            .finish()
            .await;
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].kind, LinkKind::Actor);
        assert_eq!(done[0].outcome, VerifyOutcome::Confirmed);
    }

    #[test]
    fn test_display_collapsed_post() {
        let store = Arc::new(MemoryStore::default());
        let mut note = MemoryStore::note(POST);
        note.content = Some("<p>secret</p>".into());
        note.summary = Some("Spoilers".into());
        note.published = Some(Utc.with_ymd_and_hms(2020, 3, 4, 0, 0, 0).unwrap());

        let item = renderer(&store).item(&note);
        let text = item.to_string();
        assert!(text.contains("[Spoilers] (Show more)"));
        assert!(!text.contains("secret"));
        assert!(text.contains("Mar 4, 2020"));
    }
}
