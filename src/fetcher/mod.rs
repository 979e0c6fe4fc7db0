pub mod http_fetcher;

use async_trait::async_trait;
use serde_json::Value;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// Media types accepted when dereferencing linked-data documents.
pub const ACCEPT_ACTIVITY_JSON: &str =
    "application/activity+json, application/ld+json, application/json;q=0.9";

#[async_trait]
pub trait Fetcher {
    /// Dereference `url` as a JSON document.
    ///
    /// `Ok(None)` means the server answered but has no such document;
    /// network failures and other HTTP errors are `Err`.
    async fn fetch_json(&self, url: &str) -> Result<Option<Value>>;
}
