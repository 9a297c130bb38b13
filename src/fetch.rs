use crate::error::{StageError, StageResult};

/// Asynchronous bytes-by-URL capability consumed by the loader.
///
/// Production uses [`HttpFetch`]; tests substitute an in-memory map so load
/// paths stay deterministic and network-free.
#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the raw bytes at `url`. Failures are explicit and retryable.
    async fn fetch_bytes(&self, url: &str) -> StageResult<Vec<u8>>;
}

/// HTTP implementation of [`Fetch`] backed by a shared reqwest client.
#[derive(Clone, Debug, Default)]
pub struct HttpFetch {
    client: reqwest::Client,
}

impl HttpFetch {
    /// Build a fetcher with a fresh connection pool.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Fetch for HttpFetch {
    async fn fetch_bytes(&self, url: &str) -> StageResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StageError::transport(url, e.to_string()))?
            .error_for_status()
            .map_err(|e| StageError::transport(url, e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StageError::transport(url, e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
