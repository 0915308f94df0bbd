use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Anything that can hand back the HTML of a page
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Configuration for HTTP retrieval
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff before retry `n` is `backoff_base_ms * 2^n`
    pub backoff_base_ms: u64,
    /// Status codes worth retrying
    pub retry_statuses: Vec<u16>,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 1000,
            retry_statuses: vec![500, 502, 503, 504],
            user_agent: concat!("dialogue-miner/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// HTTP page fetcher with retry and exponential backoff on server errors
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        with_retries(&self.config, url, || self.fetch_once(url)).await
    }
}

/// Run `attempt` until it succeeds, fails permanently or the retries run out.
///
/// Only errors that are transient for `config.retry_statuses` are retried;
/// retry `n` waits `config.backoff_delay(n)` first.
pub async fn with_retries<T, F, Fut>(config: &FetchConfig, url: &str, mut attempt: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut retries = 0;
    loop {
        debug!("GET {} (attempt {})", url, retries + 1);
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient(&config.retry_statuses) => {
                if retries >= config.max_retries {
                    return Err(FetchError::RetriesExhausted {
                        url: url.to_string(),
                        attempts: retries + 1,
                        last: Box::new(e),
                    });
                }
                let delay = config.backoff_delay(retries);
                warn!("{}; retrying in {:?}", e, delay);
                tokio::time::sleep(delay).await;
                retries += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
