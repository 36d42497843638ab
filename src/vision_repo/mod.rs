// Image annotation via the Cloud Vision REST API

mod wire;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::instrument;

use crate::config::VisionConfig;
use crate::error::AnalysisError;
use crate::models::{Feature, ImageAnnotations};
use wire::{AnnotateImageRequest, AnnotateRequest, AnnotateResponse, ImageContent};

pub(crate) const SERVICE: &str = "vision";

/// Annotates one image with the requested features.
///
/// Implementations must report quota exhaustion as [`AnalysisError::RateLimited`];
/// that is the only kind the caller retries.
#[async_trait]
pub trait ImageAnnotator: Send + Sync {
    async fn annotate(
        &self,
        image: &[u8],
        features: &[Feature],
    ) -> Result<ImageAnnotations, AnalysisError>;
}

pub struct VisionRepo {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl VisionRepo {
    pub fn new(config: &VisionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::version::user_agent())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        if config.api_key.is_none() {
            tracing::warn!("vision.api_key not set; annotation requests will be unauthenticated");
        }
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ImageAnnotator for VisionRepo {
    #[instrument(skip_all, fields(repo = "vision", operation = "annotate", bytes = image.len()))]
    async fn annotate(
        &self,
        image: &[u8],
        features: &[Feature],
    ) -> Result<ImageAnnotations, AnalysisError> {
        let body = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: ImageContent {
                    content: BASE64.encode(image),
                },
                features,
            }],
        };
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AnalysisError::transport(SERVICE, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AnalysisError::RateLimited { service: SERVICE });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::transport(
                SERVICE,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::transport(SERVICE, e))?;
        wire::into_annotations(parsed.single()?)
    }
}
