//! # Scorer
//!
//! Turns a prepared feature vector into a default probability, a credit score and a
//! rating tier.
//!
//! The probability comes from the tempered logistic model and is then passed through a
//! fixed adjustment cascade before clamping. The cascade is business policy layered on
//! top of the statistics: the base model overstates risk for applicants who have never
//! been delinquent, so such applicants get their probability lowered. It only ever lowers
//! risk, and its order and constants are part of the scoring contract.

use crate::features::{FeatureVector, PreparedFeatures};
use crate::model::ModelStore;
use log::error;
use std::fmt;
use thiserror::Error;

pub const BASE_SCORE: f64 = 300.0;
pub const SCALE_LENGTH: f64 = 600.0;
pub const MIN_CREDIT_SCORE: u32 = 300;
pub const MAX_CREDIT_SCORE: u32 = 900;

pub const MIN_PROBABILITY: f64 = 0.01;
pub const MAX_PROBABILITY: f64 = 0.99;

/// Subtracted from the probability of applicants with no delinquencies.
pub const GOOD_PAYER_BONUS: f64 = 0.25;
/// Above this, a no-delinquency applicant still looks high-risk and is damped further.
pub const SOFT_LANDING_THRESHOLD: f64 = 0.5;
pub const SOFT_LANDING_FACTOR: f64 = 0.8;

/// Probability above which an application is flagged for rejection.
pub const REJECTION_THRESHOLD: f64 = 0.5;

/// Base and span, in percentage points, of the indicative interest rate.
pub const BASE_INTEREST_RATE: f64 = 5.0;
pub const INTEREST_RATE_SPAN: f64 = 20.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Linear score is not finite ({raw_score}); the feature vector is malformed.")]
    NonFinite { raw_score: f64 },
    #[error("Feature vector has {found} entries, but the model has {expected} coefficients.")]
    DimensionMismatch { found: usize, expected: usize },
}

/// Discrete rating tier derived from the credit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rating {
    Poor,
    Average,
    Good,
    Excellent,
    /// Score outside [300, 900]. Unreachable after clamping; kept so the mapping is total.
    Undefined,
}

impl Rating {
    /// Bands: [300, 500) Poor, [500, 650) Average, [650, 750) Good, [750, 900] Excellent.
    pub fn from_score(score: u32) -> Self {
        match score {
            300..=499 => Rating::Poor,
            500..=649 => Rating::Average,
            650..=749 => Rating::Good,
            750..=900 => Rating::Excellent,
            _ => Rating::Undefined,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Poor => "Poor",
            Rating::Average => "Average",
            Rating::Good => "Good",
            Rating::Excellent => "Excellent",
            Rating::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Approve,
    Reject,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::Approve => "Approve",
            Recommendation::Reject => "Reject",
        })
    }
}

/// The three outputs of one prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreResult {
    /// Adjusted, clamped default probability in [0.01, 0.99].
    pub default_probability: f64,
    /// In [300, 900].
    pub credit_score: u32,
    pub rating: Rating,
}

impl ScoreResult {
    /// Probability of repayment.
    pub fn safety_score(&self) -> f64 {
        1.0 - self.default_probability
    }

    /// Indicative annual rate in percent: 5% for a risk-free applicant, 25% at certainty
    /// of default.
    pub fn projected_interest_rate(&self) -> f64 {
        BASE_INTEREST_RATE + self.default_probability * INTEREST_RATE_SPAN
    }

    pub fn recommendation(&self) -> Recommendation {
        if self.default_probability > REJECTION_THRESHOLD {
            Recommendation::Reject
        } else {
            Recommendation::Approve
        }
    }
}

/// `features · coefficients + intercept`.
pub fn linear_score(store: &ModelStore, features: &FeatureVector) -> Result<f64, ScoringError> {
    let coefficients = store.coefficients();
    if features.len() != coefficients.len() {
        return Err(ScoringError::DimensionMismatch {
            found: features.len(),
            expected: coefficients.len(),
        });
    }
    let raw_score = features.view().dot(&coefficients) + store.intercept();
    if !raw_score.is_finite() {
        error!(
            "Non-finite linear score {raw_score} for features {:?}",
            features.view()
        );
        return Err(ScoringError::NonFinite { raw_score });
    }
    Ok(raw_score)
}

#[inline]
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// The adjustment cascade. `delinquency_ratio` is the applicant's unscaled ratio.
pub fn adjust_probability(probability: f64, delinquency_ratio: f64) -> f64 {
    let never_delinquent = delinquency_ratio <= 0.0;
    let mut p = probability;

    if never_delinquent {
        p = (p - GOOD_PAYER_BONUS).max(0.0);
    }
    if p > SOFT_LANDING_THRESHOLD && never_delinquent {
        p *= SOFT_LANDING_FACTOR;
    }
    p.clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

/// `300 + (1 - p) * 600`, truncated toward zero.
pub fn credit_score(default_probability: f64) -> u32 {
    (BASE_SCORE + (1.0 - default_probability) * SCALE_LENGTH) as u32
}

pub fn score(store: &ModelStore, prepared: &PreparedFeatures) -> Result<ScoreResult, ScoringError> {
    let raw_score = linear_score(store, &prepared.features)?;
    let default_probability = adjust_probability(logistic(raw_score), prepared.delinquency_ratio);
    let credit_score = credit_score(default_probability);
    Ok(ScoreResult {
        default_probability,
        credit_score,
        rating: Rating::from_score(credit_score),
    })
}
