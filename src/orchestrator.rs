// Batch orchestration: posts in, one streamed JSON array out, strictly in input order

use futures_util::Stream;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::analyzer::PostAnalyzer;
use crate::error::AnalysisError;
use crate::models::RawPost;
use crate::stats::AnalysisStats;
use crate::stream::{Chunk, StreamingAggregator, body_stream, chunk_channel};

/// What a completed batch produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub processed: u64,
    pub emitted: u64,
    pub skipped: u64,
}

pub struct BatchOrchestrator {
    analyzer: Arc<PostAnalyzer>,
    stats: Arc<AnalysisStats>,
}

impl BatchOrchestrator {
    pub fn new(analyzer: Arc<PostAnalyzer>, stats: Arc<AnalysisStats>) -> Self {
        Self { analyzer, stats }
    }

    /// Drive every post through the analyzer, one at a time, feeding `aggregator`.
    /// Stops at the first fatal error; the array is left open either way.
    pub async fn run(
        &self,
        posts: &[RawPost],
        aggregator: &mut StreamingAggregator,
    ) -> Result<BatchSummary, AnalysisError> {
        tracing::info!("Received {} posts to analyse", posts.len());
        self.stats.batches_total.fetch_add(1, Ordering::Relaxed);

        let mut processed: u64 = 0;
        for post in posts {
            if post.is_image() {
                let result = self.analyzer.analyze(post).await?;
                aggregator.emit(&result).await?;
                self.stats
                    .results_emitted_total
                    .fetch_add(1, Ordering::Relaxed);
            } else {
                aggregator.skip();
            }
            processed += 1;
            self.stats
                .posts_processed_total
                .fetch_add(1, Ordering::Relaxed);
            tracing::info!("Analysed {} posts.", processed);
        }

        Ok(BatchSummary {
            processed,
            emitted: aggregator.emitted(),
            skipped: aggregator.skipped(),
        })
    }

    /// [`run`](Self::run), then close the array on success or abort the stream on failure.
    pub async fn run_to_end(
        &self,
        posts: &[RawPost],
        mut aggregator: StreamingAggregator,
    ) -> Result<BatchSummary, AnalysisError> {
        match self.run(posts, &mut aggregator).await {
            Ok(summary) => {
                aggregator.close().await?;
                Ok(summary)
            }
            Err(e) => {
                self.stats
                    .failed_batches_total
                    .fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %e, operation = "analyse_batch", "batch aborted");
                if matches!(e, AnalysisError::ClientDisconnected) {
                    return Err(e);
                }
                let reported = AnalysisError::transport("batch", &e);
                aggregator.abort(reported).await;
                Err(e)
            }
        }
    }

    /// Run the batch on its own task and return the response body stream.
    pub fn spawn_stream(
        self: Arc<Self>,
        posts: Vec<RawPost>,
    ) -> impl Stream<Item = Chunk> + Send + 'static {
        let (tx, rx) = chunk_channel();
        tokio::spawn(async move {
            let aggregator = match StreamingAggregator::open(tx).await {
                Ok(a) => a,
                Err(_) => {
                    tracing::debug!("client disconnected before the first chunk");
                    return;
                }
            };
            if let Ok(summary) = self.run_to_end(&posts, aggregator).await {
                tracing::info!(
                    processed = summary.processed,
                    emitted = summary.emitted,
                    skipped = summary.skipped,
                    "batch complete"
                );
            }
        });
        body_stream(rx)
    }
}
