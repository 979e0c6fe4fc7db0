//! # Strand
//!
//! A reader for federated social timelines: notes from followed actors,
//! ingested into a local store and paged through in a chosen order.
//!
//! ## Architecture
//!
//! ```text
//! IngestionCoordinator → PaginationController → ContentStore search
//!     → ContentNormalizer → LinkResolver → rendered feed items
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! strand follow https://example.org/@alice
//! strand ingest
//! strand timeline --sort oldest --pages 2
//! strand post https://example.org/@alice/1 --replies
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the store, fetcher,
/// normalizer and ingestion coordinator together.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/strand/config.toml`.
pub mod config;

/// Notes, activities, actors and timeline ordering.
pub mod domain;

/// Retrieval of remote linked-data documents.
pub mod fetcher;

/// Startup ingestion of followed actors.
pub mod ingest;

/// Conversion of note content into render-agnostic segments.
pub mod normalizer;

/// Single-post rendering and feed items.
pub mod render;

/// Actor/post link detection, rewriting and background verification.
pub mod resolver;

/// Removal of unsafe markup from untrusted content.
pub mod sanitizer;

/// SQLite persistence and the content store contract.
pub mod store;

/// Timeline pagination and view intents.
pub mod timeline;

#[cfg(test)]
pub(crate) mod testing;
