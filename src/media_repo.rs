// Media download over plain HTTP

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use std::time::Duration;
use tracing::instrument;

use crate::config::MediaConfig;
use crate::error::AnalysisError;

const SERVICE: &str = "media";

/// Fetches the raw bytes behind a post's media URL. Failures are fatal for the post.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, AnalysisError>;
}

pub struct MediaRepo {
    client: reqwest::Client,
    max_bytes: u64,
}

impl MediaRepo {
    pub fn new(config: &MediaConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::version::user_agent())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }
}

#[async_trait]
impl MediaFetcher for MediaRepo {
    #[instrument(skip(self), fields(repo = "media", operation = "fetch"))]
    async fn fetch(&self, url: &str) -> Result<Bytes, AnalysisError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnalysisError::transport(SERVICE, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::transport(
                SERVICE,
                format!("GET {} returned {}", url, status),
            ));
        }
        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes)
        {
            return Err(too_large(url, self.max_bytes));
        }

        // Content-Length may be absent or wrong; enforce the cap while reading.
        let mut body = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| AnalysisError::transport(SERVICE, e))?;
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large(url, self.max_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        tracing::debug!(bytes = body.len(), "media fetched");
        Ok(Bytes::from(body))
    }
}

fn too_large(url: &str, max_bytes: u64) -> AnalysisError {
    AnalysisError::transport(
        SERVICE,
        format!("{} exceeds the {} byte media limit", url, max_bytes),
    )
}
