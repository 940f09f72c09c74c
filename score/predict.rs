//! The composition entry point: feature building followed by scoring, against either an
//! explicit `ModelStore` or the process-wide one.

use crate::model::{self, ModelLoadError, ModelStore};
use crate::scorer::{ScoreResult, ScoringError};
use crate::types::{ApplicantInput, ApplicantRecord, UnknownCategoryError};
use thiserror::Error;

/// Any reason a prediction was refused. No variant carries a fallback score.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl ModelStore {
    /// Validates the categorical fields of `record`, then scores it.
    pub fn predict_record(&self, record: &ApplicantRecord) -> Result<ScoreResult, PredictError> {
        let input = ApplicantInput::try_from(record)?;
        Ok(self.predict(&input)?)
    }
}

/// Scores one applicant against the process-wide model, loading it on first use.
pub fn predict(input: &ApplicantInput) -> Result<ScoreResult, PredictError> {
    let store = model::global()?;
    Ok(store.predict(input)?)
}

/// As `predict`, for a string-typed record.
pub fn predict_record(record: &ApplicantRecord) -> Result<ScoreResult, PredictError> {
    model::global()?.predict_record(record)
}
