//! Shared fixtures for the unit tests.

use crate::model::{
    LinearModelParams, ModelArtifact, ModelKind, ModelStore, ScalerKind, ScalerParams,
};
use crate::types::{ApplicantInput, ApplicantRecord};
use std::path::PathBuf;

pub fn reference_artifact_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("artifacts/model_data.toml")
}

pub fn reference_artifact() -> ModelArtifact {
    ModelArtifact::load(&reference_artifact_path()).expect("reference artifact loads")
}

pub fn reference_store() -> ModelStore {
    ModelStore::from_artifact(reference_artifact()).expect("reference store builds")
}

/// An artifact over `features` with the given untempered coefficients and an identity
/// scaler (center 0, scale 1) over `scaled`.
pub fn simple_artifact(features: &[&str], coefficients: &[f64], scaled: &[&str]) -> ModelArtifact {
    ModelArtifact {
        features: features.iter().map(|s| s.to_string()).collect(),
        cols_to_scale: scaled.iter().map(|s| s.to_string()).collect(),
        model: LinearModelParams {
            kind: ModelKind::LogisticRegression,
            intercept: 0.0,
            coefficients: coefficients.to_vec(),
        },
        scaler: ScalerParams {
            kind: ScalerKind::Standard,
            center: vec![0.0; scaled.len()],
            scale: vec![1.0; scaled.len()],
        },
    }
}

/// A store over `features` with unit coefficients, zero intercept and no scaling.
pub fn identity_store(features: &[&str]) -> ModelStore {
    let coefficients = vec![1.0; features.len()];
    ModelStore::from_artifact(simple_artifact(features, &coefficients, &[]))
        .expect("identity store builds")
}

pub fn baseline_record() -> ApplicantRecord {
    ApplicantRecord {
        applicant_id: None,
        age: 28,
        income: 1_200_000.0,
        loan_amount: 2_560_000.0,
        loan_tenure_months: 36,
        avg_dpd_per_delinquency: 20,
        delinquency_ratio: 30.0,
        credit_utilization_ratio: 30.0,
        num_open_accounts: 2,
        residence_type: "Owned".to_string(),
        loan_purpose: "Education".to_string(),
        loan_type: "Unsecured".to_string(),
    }
}

pub fn baseline_input() -> ApplicantInput {
    ApplicantInput::try_from(&baseline_record()).expect("baseline record is valid")
}
