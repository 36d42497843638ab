// Per-post analysis output

use serde::{Deserialize, Serialize};

use super::annotation::{FaceAnnotation, ImageAnnotations, Likelihood, Sentiment};
use super::post::PostId;

/// Four-emotion likelihood set for one detected face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionScores {
    pub joy: Likelihood,
    pub anger: Likelihood,
    pub sorrow: Likelihood,
    pub surprise: Likelihood,
}

impl From<&FaceAnnotation> for EmotionScores {
    fn from(face: &FaceAnnotation) -> Self {
        Self {
            joy: face.joy,
            anger: face.anger,
            sorrow: face.sorrow,
            surprise: face.surprise,
        }
    }
}

/// One analysed image post. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: PostId,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub faces: Vec<EmotionScores>,
    pub labels: Vec<String>,
    pub logos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_sentiment: Option<Sentiment>,
}

impl AnalysisResult {
    /// Normalize raw annotations; landmarks are requested but not reported.
    pub fn from_annotations(
        id: PostId,
        timestamp: i64,
        annotations: &ImageAnnotations,
        caption_sentiment: Option<Sentiment>,
    ) -> Self {
        Self {
            id,
            timestamp,
            faces: annotations.faces.iter().map(EmotionScores::from).collect(),
            labels: annotations
                .labels
                .iter()
                .map(|l| l.description.clone())
                .collect(),
            logos: annotations
                .logos
                .iter()
                .map(|l| l.description.clone())
                .collect(),
            caption_sentiment,
        }
    }
}
