// Per-post analysis: fetch media, annotate (with retry), score caption, normalize

use std::sync::Arc;
use tracing::instrument;

use crate::error::AnalysisError;
use crate::language_repo::SentimentAnalyzer;
use crate::media_repo::MediaFetcher;
use crate::models::{AnalysisResult, Feature, RawPost, default_features};
use crate::retry::RetryPolicy;
use crate::vision_repo::ImageAnnotator;

/// Collaborator handles, built once and shared across requests.
#[derive(Clone)]
pub struct Collaborators {
    pub media: Arc<dyn MediaFetcher>,
    pub vision: Arc<dyn ImageAnnotator>,
    pub language: Arc<dyn SentimentAnalyzer>,
}

pub struct PostAnalyzer {
    collaborators: Collaborators,
    features: Vec<Feature>,
    retry: RetryPolicy,
}

impl PostAnalyzer {
    pub fn new(collaborators: Collaborators, retry: RetryPolicy, max_results: u32) -> Self {
        Self {
            collaborators,
            features: default_features(max_results),
            retry,
        }
    }

    /// Analyse one image post. Only the annotation call is retried (on rate limiting);
    /// media and sentiment failures propagate as-is.
    #[instrument(skip_all, fields(post_id = %post.id))]
    pub async fn analyze(&self, post: &RawPost) -> Result<AnalysisResult, AnalysisError> {
        let url = post.media.as_deref().ok_or_else(|| {
            AnalysisError::MalformedInput(format!("post {}: image post without media", post.id))
        })?;
        let timestamp = post.timestamp_ms().ok_or_else(|| {
            AnalysisError::MalformedInput(format!("post {}: time out of range", post.id))
        })?;

        let image = self.collaborators.media.fetch(url).await?;

        let vision = self.collaborators.vision.as_ref();
        let (bytes, features) = (&image[..], self.features.as_slice());
        let annotations = self
            .retry
            .attempt(move || vision.annotate(bytes, features))
            .await?;
        tracing::debug!(
            faces = annotations.faces.len(),
            labels = annotations.labels.len(),
            logos = annotations.logos.len(),
            landmarks = annotations.landmarks.len(),
            "image annotated"
        );

        let caption_sentiment = match post.caption() {
            Some(text) => Some(self.collaborators.language.analyze_sentiment(text).await?),
            None => None,
        };

        Ok(AnalysisResult::from_annotations(
            post.id.clone(),
            timestamp,
            &annotations,
            caption_sentiment,
        ))
    }
}
