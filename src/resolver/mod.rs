//! Classification and rewriting of links embedded in post content.
//!
//! Links that look like actors or posts are rewritten to local routes right
//! away. Whether the target actually exists is checked afterwards, in the
//! background, and the outcome is only reported: the rewritten href stays
//! as it is either way.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::store::ContentStore;

pub const PROFILE_ROUTE: &str = "/profile.html";
pub const POST_ROUTE: &str = "/post.html";

/// Suffix of actor descriptor documents on static-site actors.
pub const ACTOR_DESCRIPTOR_SUFFIX: &str = "about.jsonld";
/// Suffix of any linked-data document.
pub const LINKED_DATA_SUFFIX: &str = ".jsonld";

static ACTOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?|ipns|hyper)://([^/]+)/@([A-Za-z0-9_]+)$").expect("valid actor regex")
});
static POST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?|ipns|hyper)://([^/]+)/@([A-Za-z0-9_]+)/(\d+)$").expect("valid post regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Actor,
    Post,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    pub kind: LinkKind,
    pub original_href: String,
    pub rewritten_href: String,
}

/// Actor patterns are checked first, so `about.jsonld` is an actor even
/// though it also carries the linked-data suffix.
pub fn classify(href: &str) -> LinkKind {
    if ACTOR_RE.is_match(href) || href.ends_with(ACTOR_DESCRIPTOR_SUFFIX) {
        LinkKind::Actor
    } else if POST_RE.is_match(href) || href.ends_with(LINKED_DATA_SUFFIX) {
        LinkKind::Post
    } else {
        LinkKind::External
    }
}

pub fn profile_route(actor_url: &str) -> String {
    format!("{}?actor={}", PROFILE_ROUTE, urlencoding::encode(actor_url))
}

pub fn post_route(post_url: &str) -> String {
    format!("{}?url={}", POST_ROUTE, urlencoding::encode(post_url))
}

/// Optimistic rewrite: no lookup happens here.
pub fn rewrite(href: &str) -> LinkReference {
    let kind = classify(href);
    let rewritten_href = match kind {
        LinkKind::Actor => profile_route(href),
        LinkKind::Post => post_route(href),
        LinkKind::External => href.to_string(),
    };
    LinkReference {
        kind,
        original_href: href.to_string(),
        rewritten_href,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The store knows the target.
    Confirmed,
    /// The store answered but has no such object.
    Missing,
    /// The lookup failed.
    Failed(String),
    /// The owner went away before the lookup finished.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub href: String,
    pub kind: LinkKind,
    pub outcome: VerifyOutcome,
}

/// Background existence checks for rewritten links.
#[derive(Clone)]
pub struct LinkResolver {
    store: Arc<dyn ContentStore>,
}

impl LinkResolver {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub fn rewrite(&self, href: &str) -> LinkReference {
        rewrite(href)
    }

    /// Check a single link. A no-op once `token` is cancelled.
    pub async fn verify(&self, link: &LinkReference, token: &CancellationToken) -> Verification {
        verify_link(self.store.clone(), link.clone(), token.clone()).await
    }

    /// Start one check per actor/post link, all at once and in no particular order.
    pub fn verify_all<'a, I>(&self, links: I, token: CancellationToken) -> VerificationSet
    where
        I: IntoIterator<Item = &'a LinkReference>,
    {
        let mut tasks = JoinSet::new();
        for link in links {
            if link.kind == LinkKind::External {
                continue;
            }
            tasks.spawn(verify_link(self.store.clone(), link.clone(), token.clone()));
        }
        VerificationSet { tasks, token }
    }
}

async fn verify_link(
    store: Arc<dyn ContentStore>,
    link: LinkReference,
    token: CancellationToken,
) -> Verification {
    let href = link.original_href;
    let kind = link.kind;

    let outcome = if token.is_cancelled() {
        VerifyOutcome::Cancelled
    } else {
        let lookup = async {
            match kind {
                LinkKind::Actor => store.get_actor(&href).await.map(|a| a.is_some()),
                LinkKind::Post => store.get_note(&href).await.map(|n| n.is_some()),
                LinkKind::External => Ok(true),
            }
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => VerifyOutcome::Cancelled,
            found = lookup => match found {
                Ok(true) => VerifyOutcome::Confirmed,
                Ok(false) => {
                    debug!("{:?} {} not found in store, keeping default route", kind, href);
                    VerifyOutcome::Missing
                }
                Err(e) => {
                    debug!("Error verifying {:?} {}: {}", kind, href, e);
                    VerifyOutcome::Failed(e.to_string())
                }
            },
        }
    };

    Verification { href, kind, outcome }
}

/// Outstanding checks for the links of one rendered note.
///
/// Dropping the set cancels whatever is still running.
pub struct VerificationSet {
    tasks: JoinSet<Verification>,
    token: CancellationToken,
}

impl VerificationSet {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Next finished check, in completion order.
    pub async fn next(&mut self) -> Option<Verification> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(verification) => return Some(verification),
                Err(e) => warn!("Link verification task failed: {}", e),
            }
        }
        None
    }

    pub async fn finish(mut self) -> Vec<Verification> {
        let mut done = Vec::with_capacity(self.tasks.len());
        while let Some(verification) = self.next().await {
            done.push(verification);
        }
        done
    }
}

impl Drop for VerificationSet {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
