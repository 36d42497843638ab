// Shared test helpers: stub collaborators and a wired-up orchestrator

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use post_analyser::analyzer::{Collaborators, PostAnalyzer};
use post_analyser::error::AnalysisError;
use post_analyser::language_repo::SentimentAnalyzer;
use post_analyser::media_repo::MediaFetcher;
use post_analyser::models::*;
use post_analyser::orchestrator::BatchOrchestrator;
use post_analyser::retry::RetryPolicy;
use post_analyser::stats::AnalysisStats;
use post_analyser::vision_repo::ImageAnnotator;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Returns the URL as bytes; URLs in `failing` return a transport error.
#[derive(Default)]
pub struct StubMedia {
    pub failing: HashSet<String>,
    pub fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaFetcher for StubMedia {
    async fn fetch(&self, url: &str) -> Result<Bytes, AnalysisError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(AnalysisError::transport("media", format!("GET {} failed", url)));
        }
        Ok(Bytes::copy_from_slice(url.as_bytes()))
    }
}

/// Pops scripted replies in order; empty annotations once the script runs out.
#[derive(Default)]
pub struct StubVision {
    pub script: Mutex<VecDeque<Result<ImageAnnotations, AnalysisError>>>,
    pub calls: Mutex<Vec<(tokio::time::Instant, Vec<Feature>)>>,
}

impl StubVision {
    pub fn scripted(replies: Vec<Result<ImageAnnotations, AnalysisError>>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageAnnotator for StubVision {
    async fn annotate(
        &self,
        _image: &[u8],
        features: &[Feature],
    ) -> Result<ImageAnnotations, AnalysisError> {
        self.calls
            .lock()
            .unwrap()
            .push((tokio::time::Instant::now(), features.to_vec()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ImageAnnotations::default()))
    }
}

pub struct StubLanguage {
    pub sentiment: Sentiment,
    pub fail: bool,
    pub texts: Mutex<Vec<String>>,
}

impl Default for StubLanguage {
    fn default() -> Self {
        Self {
            sentiment: Sentiment {
                score: 0.8,
                magnitude: 1.2,
            },
            fail: false,
            texts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SentimentAnalyzer for StubLanguage {
    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, AnalysisError> {
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(AnalysisError::transport("language", "sentiment unavailable"));
        }
        Ok(self.sentiment)
    }
}

pub struct Harness {
    pub media: Arc<StubMedia>,
    pub vision: Arc<StubVision>,
    pub language: Arc<StubLanguage>,
    pub stats: Arc<AnalysisStats>,
    pub orchestrator: Arc<BatchOrchestrator>,
}

pub fn harness(media: StubMedia, vision: StubVision, language: StubLanguage) -> Harness {
    harness_with_retry(media, vision, language, RetryPolicy::default())
}

pub fn harness_with_retry(
    media: StubMedia,
    vision: StubVision,
    language: StubLanguage,
    retry: RetryPolicy,
) -> Harness {
    let media = Arc::new(media);
    let vision = Arc::new(vision);
    let language = Arc::new(language);
    let stats = Arc::new(AnalysisStats::default());
    let collaborators = Collaborators {
        media: media.clone(),
        vision: vision.clone(),
        language: language.clone(),
    };
    let analyzer = Arc::new(PostAnalyzer::new(
        collaborators,
        retry.with_counter(stats.rate_limited_total.clone()),
        10,
    ));
    let orchestrator = Arc::new(BatchOrchestrator::new(analyzer, stats.clone()));
    Harness {
        media,
        vision,
        language,
        stats,
        orchestrator,
    }
}

pub fn default_harness() -> Harness {
    harness(
        StubMedia::default(),
        StubVision::default(),
        StubLanguage::default(),
    )
}

pub fn image_post(id: i64, time: i64) -> RawPost {
    RawPost {
        id: PostId::Int(id),
        time,
        kind: PostType::Image,
        media: Some(format!("http://x/{}.png", id)),
        text: None,
    }
}

pub fn text_post(id: i64, time: i64) -> RawPost {
    RawPost {
        id: PostId::Int(id),
        time,
        kind: PostType::Other,
        media: None,
        text: Some("just words".into()),
    }
}

pub fn rate_limited() -> AnalysisError {
    AnalysisError::RateLimited { service: "vision" }
}
