use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::app::{Result, StrandError};
use crate::config::FetcherConfig;
use crate::fetcher::{Fetcher, ACCEPT_ACTIVITY_JSON};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Option<Value>> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StrandError::Transport(format!(
                "No transport for {} URLs: {}",
                parsed.scheme(),
                url
            )));
        }

        let response = self
            .client
            .get(parsed)
            .header(ACCEPT, ACCEPT_ACTIVITY_JSON)
            .send()
            .await?;

        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Ok(None);
        }

        response.error_for_status_ref()?;

        let body = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_unsupported_scheme() {
        let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
        let err = fetcher
            .fetch_json("ipns://example.org/@alice")
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_rejects_garbage_url() {
        let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
        let err = fetcher.fetch_json("not a url").await.unwrap_err();
        assert!(matches!(err, StrandError::InvalidUrl(_)));
    }
}
