use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::FetchError;
use crate::rate_gate::RateGate;

const JSON_USER_AGENT: &str = "VineFullHarvester/1.0";
const MEDIA_USER_AGENT: &str = "VineFullHarvesterMedia/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const IDLE_CONNS_PER_HOST: usize = 200;

/// Single shared HTTP client for the whole process. Every GET — JSON fetch
/// or media download — passes through the same `RateGate` before hitting
/// the wire, so one process-wide budget covers both stages.
pub struct HttpFetcher {
    client: Client,
    rate_gate: Arc<RateGate>,
}

impl HttpFetcher {
    pub fn new(rate_gate: Arc<RateGate>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(IDLE_CONNS_PER_HOST)
            .build()
            .expect("failed to build HTTP client");
        Self { client, rate_gate }
    }

    /// GETs `url`, decoding the body as a generic JSON value. Non-200
    /// responses drain and discard the body before returning `HttpStatus`.
    pub async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.rate_gate.acquire().await;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, JSON_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            // Drain the body so the connection can be returned to the pool.
            let _ = response.bytes().await;
            return Err(FetchError::HttpStatus(status));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(FetchError::Decode)
    }

    /// Streams `url`'s body to `dest` (a freshly-created file), for the
    /// Media Fetcher. Caller is responsible for the temp-file-plus-rename
    /// protocol; this only performs the GET and the streaming write.
    pub async fn download_to(
        &self,
        url: &str,
        dest: &mut tokio::fs::File,
    ) -> Result<(), FetchError> {
        use futures::StreamExt;
        use tokio::io::AsyncWriteExt;

        self.rate_gate.acquire().await;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, MEDIA_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let _ = response.bytes().await;
            return Err(FetchError::HttpStatus(status));
        }

        let mut stream = response.bytes_stream();
        let mut writer = tokio::io::BufWriter::with_capacity(256 * 1024, dest);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;
        Ok(())
    }
}
