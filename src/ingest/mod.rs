//! One-time ingestion of followed actors before the first timeline page.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::app::Result;
use crate::store::ContentStore;

/// Outcome of the startup ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Actor URL and number of notes stored.
    pub ingested: Vec<(String, usize)>,
    /// Actor URL and error message.
    pub failed: Vec<(String, String)>,
}

impl IngestReport {
    pub fn total_notes(&self) -> usize {
        self.ingested.iter().map(|(_, count)| count).sum()
    }
}

/// Owned by the application root and shared by every timeline.
///
/// The first `ensure_ready` ingests all followed actors; concurrent callers
/// wait on that same pass, later callers return at once.
pub struct IngestionCoordinator {
    store: Arc<dyn ContentStore>,
    default_followed: Vec<String>,
    ready: OnceCell<IngestReport>,
}

impl IngestionCoordinator {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            default_followed: Vec::new(),
            ready: OnceCell::new(),
        }
    }

    /// Actors followed automatically when the follow list is empty.
    pub fn with_default_followed(mut self, urls: Vec<String>) -> Self {
        self.default_followed = urls;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// A failure to read the follow list leaves the coordinator unready, so
    /// the next call tries again. Individual actor failures do not.
    pub async fn ensure_ready(&self) -> Result<&IngestReport> {
        self.ready.get_or_try_init(|| self.ingest_followed()).await
    }

    async fn ingest_followed(&self) -> Result<IngestReport> {
        let mut followed = self.store.get_followed_actors().await?;

        if followed.is_empty() && !self.default_followed.is_empty() {
            for url in &self.default_followed {
                self.store.follow_actor(url).await?;
            }
            info!("Following {} default actors", self.default_followed.len());
            followed = self.store.get_followed_actors().await?;
        }

        let results = join_all(followed.into_iter().map(|actor| async move {
            let result = self.store.ingest_actor(&actor.url).await;
            (actor.url, result)
        }))
        .await;

        let mut report = IngestReport::default();
        for (url, result) in results {
            match result {
                Ok(count) => report.ingested.push((url, count)),
                Err(e) => {
                    warn!("Failed to ingest {}: {}", url, e);
                    report.failed.push((url, e.to_string()));
                }
            }
        }

        info!(
            "All followed actors have been ingested ({} ok, {} failed)",
            report.ingested.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
