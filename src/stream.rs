// Incremental JSON-array writer: one flushed chunk per analysed post

use bytes::Bytes;
use futures_util::Stream;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::AnalysisError;
use crate::models::AnalysisResult;

/// One body chunk, or the error that aborted the stream.
pub type Chunk = Result<Bytes, AnalysisError>;

/// Chunks in flight between the orchestrator and the response body. With one slot the
/// orchestrator cannot run ahead of the client, so memory stays flat for any batch size.
pub const CHUNK_CHANNEL_CAPACITY: usize = 1;

pub fn chunk_channel() -> (mpsc::Sender<Chunk>, mpsc::Receiver<Chunk>) {
    mpsc::channel(CHUNK_CHANNEL_CAPACITY)
}

/// Adapt the receiving end into a body stream.
pub fn body_stream(rx: mpsc::Receiver<Chunk>) -> impl Stream<Item = Chunk> + Send + 'static {
    futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    })
}

/// Writes `[`, then each result (comma-separated), then `]`.
///
/// `[` is sent on construction, so zero results still produce `[]`.
/// Nothing is buffered: every call sends its chunk before returning.
pub struct StreamingAggregator {
    tx: mpsc::Sender<Chunk>,
    wrote_any: bool,
    emitted: u64,
    skipped: u64,
}

impl StreamingAggregator {
    pub async fn open(tx: mpsc::Sender<Chunk>) -> Result<Self, AnalysisError> {
        let mut aggregator = Self {
            tx,
            wrote_any: false,
            emitted: 0,
            skipped: 0,
        };
        aggregator.send(Bytes::from_static(b"[")).await?;
        Ok(aggregator)
    }

    pub async fn emit(&mut self, result: &AnalysisResult) -> Result<(), AnalysisError> {
        self.write_item(result).await?;
        self.emitted += 1;
        Ok(())
    }

    /// A post that produces no result (non-image).
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    async fn write_item<T: Serialize>(&mut self, item: &T) -> Result<(), AnalysisError> {
        let mut buf = Vec::with_capacity(256);
        if self.wrote_any {
            buf.push(b',');
        }
        serde_json::to_writer(&mut buf, item)?;
        self.send(Bytes::from(buf)).await?;
        self.wrote_any = true;
        Ok(())
    }

    /// Terminate the array.
    pub async fn close(mut self) -> Result<(), AnalysisError> {
        self.send(Bytes::from_static(b"]")).await
    }

    /// Hand a fatal error to the body so the transfer is cut short; `]` is never written.
    pub async fn abort(self, err: AnalysisError) {
        if self.tx.send(Err(err)).await.is_err() {
            tracing::debug!("response body already dropped; abort not delivered");
        }
    }

    async fn send(&mut self, chunk: Bytes) -> Result<(), AnalysisError> {
        self.tx
            .send(Ok(chunk))
            .await
            .map_err(|_| AnalysisError::ClientDisconnected)
    }
}
