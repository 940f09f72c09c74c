// ========================================================================================
//
//                         APPLICANT DOMAIN TYPES
//
// ========================================================================================
//
// The raw attributes a caller supplies for one credit application. Two shapes exist:
// `ApplicantRecord`, whose categorical fields are free-form strings exactly as they
// arrive from a form or a TSV row, and `ApplicantInput`, whose categorical fields have
// been checked against their closed domains. Only the latter reaches the feature builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A categorical value fell outside its declared domain. The request is rejected; the
/// value is never coerced to a nearby category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {field} '{value}'. Expected one of: {}.", .expected.join(", "))]
pub struct UnknownCategoryError {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static [&'static str],
}

/// Generates a closed categorical enum with exact, case-sensitive string parsing.
macro_rules! category_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const FIELD: &'static str = $field;
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownCategoryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok(Self::$variant),)+
                    other => Err(UnknownCategoryError {
                        field: Self::FIELD,
                        value: other.to_string(),
                        expected: Self::LABELS,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

category_enum! {
    /// Housing situation of the applicant.
    ResidenceType, "residence type" {
        Owned => "Owned",
        Rented => "Rented",
        Mortgage => "Mortgage",
    }
}

category_enum! {
    /// What the loan is for.
    LoanPurpose, "loan purpose" {
        Education => "Education",
        Home => "Home",
        Auto => "Auto",
        Personal => "Personal",
    }
}

category_enum! {
    /// Whether the loan is backed by collateral.
    LoanType, "loan type" {
        Unsecured => "Unsecured",
        Secured => "Secured",
    }
}

/// A validated credit application.
///
/// Bounds (age ≥ 18, percentages in 0–100, at least one open account) are the caller's
/// responsibility; nothing here panics on boundary or zero values.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantInput {
    /// Years.
    pub age: u32,
    /// Annual income in currency units.
    pub income: f64,
    /// Requested principal in currency units.
    pub loan_amount: f64,
    pub loan_tenure_months: u32,
    /// Average days past due per delinquency event.
    pub avg_dpd_per_delinquency: u32,
    /// Percentage of payments that were delinquent, 0–100.
    pub delinquency_ratio: f64,
    /// Percentage of available credit in use, 0–100.
    pub credit_utilization_ratio: f64,
    pub num_open_accounts: u32,
    pub residence_type: ResidenceType,
    pub loan_purpose: LoanPurpose,
    pub loan_type: LoanType,
}

impl ApplicantInput {
    /// Loan amount over annual income. Zero when income is not positive.
    pub fn loan_to_income(&self) -> f64 {
        loan_to_income(self.loan_amount, self.income)
    }
}

fn loan_to_income(loan_amount: f64, income: f64) -> f64 {
    if income > 0.0 { loan_amount / income } else { 0.0 }
}

/// An application as supplied by an untyped caller (form fields, TSV rows).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    /// Optional caller-side identifier, echoed back in batch output.
    #[serde(default)]
    pub applicant_id: Option<String>,
    pub age: u32,
    pub income: f64,
    pub loan_amount: f64,
    pub loan_tenure_months: u32,
    pub avg_dpd_per_delinquency: u32,
    pub delinquency_ratio: f64,
    pub credit_utilization_ratio: f64,
    pub num_open_accounts: u32,
    pub residence_type: String,
    pub loan_purpose: String,
    pub loan_type: String,
}

impl ApplicantRecord {
    /// Same ratio as [`ApplicantInput::loan_to_income`], available before the categorical
    /// fields are checked.
    pub fn loan_to_income(&self) -> f64 {
        loan_to_income(self.loan_amount, self.income)
    }
}

impl TryFrom<&ApplicantRecord> for ApplicantInput {
    type Error = UnknownCategoryError;

    fn try_from(record: &ApplicantRecord) -> Result<Self, Self::Error> {
        Ok(ApplicantInput {
            age: record.age,
            income: record.income,
            loan_amount: record.loan_amount,
            loan_tenure_months: record.loan_tenure_months,
            avg_dpd_per_delinquency: record.avg_dpd_per_delinquency,
            delinquency_ratio: record.delinquency_ratio,
            credit_utilization_ratio: record.credit_utilization_ratio,
            num_open_accounts: record.num_open_accounts,
            residence_type: record.residence_type.parse()?,
            loan_purpose: record.loan_purpose.parse()?,
            loan_type: record.loan_type.parse()?,
        })
    }
}
