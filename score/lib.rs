#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod batch;
pub mod features;
pub mod predict;
pub mod scorer;
pub mod types;

#[path = "../model/mod.rs"]
pub mod model;

#[cfg(test)]
mod test_fixtures;

pub use features::{FeatureVector, PreparedFeatures, RawFeatures, build_features};
pub use model::{ModelArtifact, ModelLoadError, ModelStore};
pub use predict::{PredictError, predict, predict_record};
pub use scorer::{Rating, Recommendation, ScoreResult, ScoringError, score};
pub use types::{
    ApplicantInput, ApplicantRecord, LoanPurpose, LoanType, ResidenceType, UnknownCategoryError,
};
