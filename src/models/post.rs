// Incoming post records

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Opaque post identifier, echoed back unchanged.
///
/// Variants are tried in order: integers that fit `i64`, then larger unsigned ones,
/// then any other number, then strings. Anything else is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Other(serde_json::Value),
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostId::Int(n) => write!(f, "{}", n),
            PostId::UInt(n) => write!(f, "{}", n),
            PostId::Float(n) => write!(f, "{}", n),
            PostId::Str(s) => f.write_str(s),
            PostId::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Post kind; only images are analysed, everything else is counted and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Image,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub id: PostId,
    /// Epoch seconds.
    pub time: i64,
    #[serde(rename = "type")]
    pub kind: PostType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RawPost {
    pub fn is_image(&self) -> bool {
        self.kind == PostType::Image
    }

    /// Epoch milliseconds, or `None` when `time * 1000` does not fit.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.time.checked_mul(1000)
    }

    /// Caption text, if present and non-empty.
    pub fn caption(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Checks every post up front so a bad batch is rejected before any output is flushed.
pub fn validate_batch(posts: &[RawPost]) -> Result<(), AnalysisError> {
    for (index, post) in posts.iter().enumerate() {
        if post.timestamp_ms().is_none() {
            return Err(AnalysisError::MalformedInput(format!(
                "post {} (index {}): time {} out of range",
                post.id, index, post.time
            )));
        }
        if post.is_image() && post.media.as_deref().is_none_or(str::is_empty) {
            return Err(AnalysisError::MalformedInput(format!(
                "post {} (index {}): image post without media",
                post.id, index
            )));
        }
    }
    Ok(())
}
