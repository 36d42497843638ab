// Error kinds raised while analysing a batch

use thiserror::Error;

/// Everything that can go wrong between decoding a batch and flushing its last result.
///
/// Only [`AnalysisError::RateLimited`] is recovered locally (by the retry controller);
/// every other kind halts the batch.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The annotation service asked us to slow down.
    #[error("rate limited by {service}")]
    RateLimited { service: &'static str },

    /// Still rate limited after the configured number of attempts.
    #[error("still rate limited after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// Network, HTTP status or payload failure talking to a collaborator.
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// A post in the request batch is missing data we need.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response body receiver was dropped (client went away).
    #[error("client disconnected")]
    ClientDisconnected,
}

impl AnalysisError {
    pub fn transport(service: &'static str, message: impl std::fmt::Display) -> Self {
        AnalysisError::Transport {
            service,
            message: message.to_string(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AnalysisError::RateLimited { .. })
    }
}
