use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, StrandError};
use crate::config::Config;
use crate::domain::Sort;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::ingest::IngestionCoordinator;
use crate::normalizer::ContentNormalizer;
use crate::render::PostRenderer;
use crate::store::{ContentStore, LocalContentStore, SqliteStore};
use crate::timeline::{PaginationController, Timeline};

/// Everything a command needs, wired once at startup.
pub struct AppContext {
    pub config: Config,
    pub sqlite: Arc<SqliteStore>,
    pub store: Arc<dyn ContentStore>,
    pub normalizer: ContentNormalizer,
    pub coordinator: Arc<IngestionCoordinator>,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, config: Config) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let sqlite = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_sqlite(sqlite, config)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_sqlite(Arc::new(SqliteStore::in_memory()?), config)
    }

    fn with_sqlite(sqlite: Arc<SqliteStore>, config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetcher)?);
        let store: Arc<dyn ContentStore> = Arc::new(LocalContentStore::with_outbox_pages(
            sqlite.clone(),
            fetcher,
            config.ingestion.max_outbox_pages,
        ));
        let coordinator = Arc::new(
            IngestionCoordinator::new(store.clone())
                .with_default_followed(config.ingestion.default_followed.clone()),
        );

        Ok(Self {
            config,
            sqlite,
            store,
            normalizer: ContentNormalizer::default(),
            coordinator,
        })
    }

    pub fn renderer(&self) -> PostRenderer {
        PostRenderer::new(self.store.clone(), self.normalizer.clone())
    }

    /// A following timeline with the configured page size and skip policy.
    pub fn timeline(&self, sort: Sort, limit: Option<usize>) -> Timeline {
        let limit = limit.unwrap_or(self.config.timeline.limit);
        let controller = PaginationController::new(self.store.clone(), limit, sort)
            .with_policy(self.config.timeline.skip_policy);
        Timeline::new(controller, self.renderer(), self.coordinator.clone())
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| StrandError::Config("Could not find data directory".into()))?;
        let strand_dir = data_dir.join("strand");
        std::fs::create_dir_all(&strand_dir)?;
        Ok(strand_dir.join("strand.db"))
    }
}
