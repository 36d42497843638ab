// Domain models: incoming posts, collaborator annotations, analysis output

mod analysis;
mod annotation;
mod post;

pub use analysis::{AnalysisResult, EmotionScores};
pub use annotation::{
    EntityAnnotation, FaceAnnotation, Feature, FeatureKind, ImageAnnotations, Likelihood,
    Sentiment, default_features,
};
pub use post::{PostId, PostType, RawPost, validate_batch};
