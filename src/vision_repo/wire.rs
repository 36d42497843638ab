// images:annotate request/response bodies and their mapping to ImageAnnotations

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::models::{EntityAnnotation, FaceAnnotation, Feature, ImageAnnotations, Likelihood};

use super::SERVICE;

/// gRPC status code RESOURCE_EXHAUSTED, reported per image when quota is hit.
const RESOURCE_EXHAUSTED: i32 = 8;

#[derive(Debug, Serialize)]
pub(crate) struct AnnotateRequest<'a> {
    pub requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct AnnotateImageRequest<'a> {
    pub image: ImageContent,
    pub features: &'a [Feature],
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageContent {
    /// Base64 image bytes.
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

impl AnnotateResponse {
    /// The per-image response for our one-image request; none at all is a protocol error.
    pub fn single(self) -> Result<AnnotateImageResponse, AnalysisError> {
        self.responses
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::transport(SERVICE, "empty annotate response"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnnotateImageResponse {
    #[serde(default)]
    pub face_annotations: Vec<WireFace>,
    #[serde(default)]
    pub label_annotations: Vec<WireEntity>,
    #[serde(default)]
    pub logo_annotations: Vec<WireEntity>,
    #[serde(default)]
    pub landmark_annotations: Vec<WireEntity>,
    #[serde(default)]
    pub error: Option<WireStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireFace {
    #[serde(default)]
    pub joy_likelihood: Likelihood,
    #[serde(default)]
    pub anger_likelihood: Likelihood,
    #[serde(default)]
    pub sorrow_likelihood: Likelihood,
    #[serde(default)]
    pub surprise_likelihood: Likelihood,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireEntity {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

fn entities(wire: Vec<WireEntity>) -> Vec<EntityAnnotation> {
    wire.into_iter()
        .map(|e| EntityAnnotation::new(e.description))
        .collect()
}

/// Map the single per-image response; a quota error becomes the retryable kind.
pub(crate) fn into_annotations(
    response: AnnotateImageResponse,
) -> Result<ImageAnnotations, AnalysisError> {
    if let Some(status) = response.error
        && status.code != 0
    {
        if status.code == RESOURCE_EXHAUSTED {
            return Err(AnalysisError::RateLimited { service: SERVICE });
        }
        return Err(AnalysisError::transport(
            SERVICE,
            format!("annotation error {}: {}", status.code, status.message),
        ));
    }
    Ok(ImageAnnotations {
        faces: response
            .face_annotations
            .into_iter()
            .map(|f| FaceAnnotation {
                joy: f.joy_likelihood,
                anger: f.anger_likelihood,
                sorrow: f.sorrow_likelihood,
                surprise: f.surprise_likelihood,
            })
            .collect(),
        labels: entities(response.label_annotations),
        logos: entities(response.logo_annotations),
        landmarks: entities(response.landmark_annotations),
    })
}
