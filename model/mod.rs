#![deny(dead_code)]
#![deny(unused_imports)]

pub mod artifact;
pub mod scaler;
pub mod store;

pub use artifact::{
    LinearModelParams, ModelArtifact, ModelKind, ModelLoadError, ScalerKind, ScalerParams,
};
pub use scaler::FittedScaler;
pub use store::{
    DEFAULT_ARTIFACT_PATH, MODEL_PATH_ENV, ModelStore, TEMPERATURE, global, init_global,
    resolve_artifact_path,
};
