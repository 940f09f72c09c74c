//! # Feature Builder
//!
//! Turns one `ApplicantInput` into the ordered numeric vector the frozen model expects.
//!
//! Building happens in three fixed steps:
//!
//! 1. **Raw layout.** Every feature the builder knows how to produce is written into a
//!    fixed-size array in `RAW_FEATURE_NAMES` order: ratios, one-hot indicators,
//!    passthrough counts, and the constant placeholder columns.
//! 2. **Scaling.** The model store's fitted scaler rewrites exactly the columns in its
//!    scale subset. Everything else is left untouched.
//! 3. **Selection.** The store's feature order picks columns out of the raw layout.
//!
//! Feature names are resolved to raw positions once, when the store is loaded, so a
//! request never performs a name lookup.

use crate::model::ModelStore;
use crate::types::{ApplicantInput, LoanPurpose, LoanType, ResidenceType};
use ndarray::{Array1, ArrayView1};

pub const AGE: &str = "age";
pub const LOAN_TENURE_MONTHS: &str = "loan_tenure_months";
pub const NUMBER_OF_OPEN_ACCOUNTS: &str = "number_of_open_accounts";
pub const CREDIT_UTILIZATION_RATIO: &str = "credit_utilization_ratio";
pub const DELINQUENCY_RATIO: &str = "delinquency_ratio";
pub const LOAN_TO_INCOME: &str = "loan_to_income";
pub const AVG_DPD_PER_DELINQUENCY: &str = "avg_dpd_per_delinquency";
pub const RESIDENCE_TYPE_OWNED: &str = "residence_type_Owned";
pub const RESIDENCE_TYPE_RENTED: &str = "residence_type_Rented";
pub const LOAN_PURPOSE_EDUCATION: &str = "loan_purpose_Education";
pub const LOAN_PURPOSE_HOME: &str = "loan_purpose_Home";
pub const LOAN_PURPOSE_PERSONAL: &str = "loan_purpose_Personal";
pub const LOAN_TYPE_UNSECURED: &str = "loan_type_Unsecured";

/// Columns the trained scaler was fit with that carry no applicant information.
/// They are always filled with `PLACEHOLDER_VALUE`.
pub const PLACEHOLDER_FEATURES: [&str; 11] = [
    "number_of_dependants",
    "years_at_current_address",
    "zipcode",
    "sanction_amount",
    "processing_fee",
    "gst",
    "net_disbursement",
    "principal_outstanding",
    "bank_balance_at_application",
    "number_of_closed_accounts",
    "enquiry_count",
];

pub const PLACEHOLDER_VALUE: f64 = 1.0;

pub const RAW_FEATURE_COUNT: usize = 24;

/// Every feature the builder can produce, in raw layout order.
///
/// Mortgage residence, Auto purpose and Secured loans have no indicator column: they
/// are encoded by all of their siblings being zero, matching the category set the
/// model was trained on.
pub const RAW_FEATURE_NAMES: [&str; RAW_FEATURE_COUNT] = [
    AGE,
    LOAN_TENURE_MONTHS,
    NUMBER_OF_OPEN_ACCOUNTS,
    CREDIT_UTILIZATION_RATIO,
    DELINQUENCY_RATIO,
    LOAN_TO_INCOME,
    AVG_DPD_PER_DELINQUENCY,
    RESIDENCE_TYPE_OWNED,
    RESIDENCE_TYPE_RENTED,
    LOAN_PURPOSE_EDUCATION,
    LOAN_PURPOSE_HOME,
    LOAN_PURPOSE_PERSONAL,
    LOAN_TYPE_UNSECURED,
    PLACEHOLDER_FEATURES[0],
    PLACEHOLDER_FEATURES[1],
    PLACEHOLDER_FEATURES[2],
    PLACEHOLDER_FEATURES[3],
    PLACEHOLDER_FEATURES[4],
    PLACEHOLDER_FEATURES[5],
    PLACEHOLDER_FEATURES[6],
    PLACEHOLDER_FEATURES[7],
    PLACEHOLDER_FEATURES[8],
    PLACEHOLDER_FEATURES[9],
    PLACEHOLDER_FEATURES[10],
];

/// Position of `name` in the raw layout, if the builder produces it.
pub fn position(name: &str) -> Option<usize> {
    RAW_FEATURE_NAMES.iter().position(|&known| known == name)
}

pub fn is_placeholder(name: &str) -> bool {
    PLACEHOLDER_FEATURES.contains(&name)
}

#[inline]
fn indicator(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

/// The complete, unscaled feature layout for one applicant.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeatures {
    values: [f64; RAW_FEATURE_COUNT],
}

impl RawFeatures {
    pub fn from_input(input: &ApplicantInput) -> Self {
        let derived = [
            f64::from(input.age),
            f64::from(input.loan_tenure_months),
            f64::from(input.num_open_accounts),
            input.credit_utilization_ratio / 100.0,
            input.delinquency_ratio / 100.0,
            input.loan_to_income(),
            f64::from(input.avg_dpd_per_delinquency),
            indicator(input.residence_type == ResidenceType::Owned),
            indicator(input.residence_type == ResidenceType::Rented),
            indicator(input.loan_purpose == LoanPurpose::Education),
            indicator(input.loan_purpose == LoanPurpose::Home),
            indicator(input.loan_purpose == LoanPurpose::Personal),
            indicator(input.loan_type == LoanType::Unsecured),
        ];
        // Placeholders occupy the tail of the layout.
        let mut values = [PLACEHOLDER_VALUE; RAW_FEATURE_COUNT];
        values[..derived.len()].copy_from_slice(&derived);
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        position(name).map(|i| self.values[i])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

/// The scaled, ordered vector handed to the linear model.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Array1<f64>,
}

impl FeatureVector {
    pub(crate) fn new(values: Array1<f64>) -> Self {
        Self { values }
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A feature vector together with the applicant's original delinquency ratio.
///
/// The adjustment cascade keys off the unscaled ratio; it travels here explicitly so
/// nothing ever has to read it back out of the scaled vector.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedFeatures {
    pub features: FeatureVector,
    /// Percentage as supplied by the caller (0–100), before any division or scaling.
    pub delinquency_ratio: f64,
}

/// Builds the model-ready features for one applicant. Pure; no I/O.
pub fn build_features(store: &ModelStore, input: &ApplicantInput) -> PreparedFeatures {
    let scaled = store.scale(RawFeatures::from_input(input));
    PreparedFeatures {
        features: store.select(&scaled),
        delinquency_ratio: input.delinquency_ratio,
    }
}
