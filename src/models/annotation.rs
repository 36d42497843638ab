// Collaborator-facing types: what the annotation and sentiment services hand back

use serde::{Deserialize, Serialize};

/// Likelihood bucket reported per detected emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Image features requested from the annotation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureKind {
    LabelDetection,
    FaceDetection,
    LogoDetection,
    LandmarkDetection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub max_results: u32,
}

/// The fixed feature set used for every post. Text detection is deliberately absent:
/// caption sentiment comes from the post text, not from text found in the image.
pub fn default_features(max_results: u32) -> Vec<Feature> {
    [
        FeatureKind::LabelDetection,
        FeatureKind::FaceDetection,
        FeatureKind::LogoDetection,
        FeatureKind::LandmarkDetection,
    ]
    .into_iter()
    .map(|kind| Feature { kind, max_results })
    .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceAnnotation {
    pub joy: Likelihood,
    pub anger: Likelihood,
    pub sorrow: Likelihood,
    pub surprise: Likelihood,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityAnnotation {
    pub description: String,
}

impl EntityAnnotation {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Everything the annotation service detected in one image, in detection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageAnnotations {
    pub faces: Vec<FaceAnnotation>,
    pub labels: Vec<EntityAnnotation>,
    pub logos: Vec<EntityAnnotation>,
    pub landmarks: Vec<EntityAnnotation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub score: f64,
    pub magnitude: f64,
}
