// ========================================================================================
//
//                         BATCH SCORING OF APPLICANT FILES
//
// ========================================================================================
//
// Reads a tab-separated file with one applicant per row, scores every row against one
// model store, and writes one output row per input row. A row whose prediction is
// refused keeps its place in the output with `NA` fields and the reason; it is never
// given a substitute score.

use crate::model::ModelStore;
use crate::predict::PredictError;
use crate::scorer::ScoreResult;
use crate::types::ApplicantRecord;
use log::{info, warn};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Error reading or writing applicant TSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The outcome for one input row.
#[derive(Debug)]
pub struct BatchOutcome {
    /// The row's `applicant_id`, or its 1-based row number when absent.
    pub applicant_id: String,
    /// Reported even when the row could not be scored.
    pub loan_to_income: f64,
    pub result: Result<ScoreResult, PredictError>,
}

pub const OUTPUT_HEADER: [&str; 9] = [
    "applicant_id",
    "default_probability",
    "safety_score",
    "credit_score",
    "rating",
    "projected_interest_rate",
    "recommendation",
    "loan_to_income",
    "error",
];

/// Reads every applicant row of a tab-separated file with a header line.
pub fn load_applicants(path: &Path) -> Result<Vec<ApplicantRecord>, BatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_path(path)?;
    let records = reader
        .deserialize::<ApplicantRecord>()
        .collect::<Result<Vec<_>, csv::Error>>()?;
    info!("Loaded {} applicant rows from {}", records.len(), path.display());
    Ok(records)
}

pub fn score_applicants(store: &ModelStore, records: &[ApplicantRecord]) -> Vec<BatchOutcome> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let applicant_id = record
                .applicant_id
                .clone()
                .unwrap_or_else(|| (i + 1).to_string());
            let result = store.predict_record(record);
            if let Err(e) = &result {
                warn!("Applicant {applicant_id} was not scored: {e}");
            }
            BatchOutcome {
                applicant_id,
                loan_to_income: record.loan_to_income(),
                result,
            }
        })
        .collect()
}

/// Writes one TSV row per outcome, in order.
pub fn write_predictions(path: &Path, outcomes: &[BatchOutcome]) -> Result<(), BatchError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;
    writer.write_record(OUTPUT_HEADER)?;

    for outcome in outcomes {
        let lti = outcome.loan_to_income;
        let row: [String; 9] = match &outcome.result {
            Ok(r) => [
                outcome.applicant_id.clone(),
                r.default_probability.to_string(),
                r.safety_score().to_string(),
                r.credit_score.to_string(),
                r.rating.to_string(),
                format!("{:.2}", r.projected_interest_rate()),
                r.recommendation().to_string(),
                format!("{lti:.2}"),
                String::new(),
            ],
            Err(e) => [
                outcome.applicant_id.clone(),
                "NA".to_string(),
                "NA".to_string(),
                "NA".to_string(),
                "NA".to_string(),
                "NA".to_string(),
                "NA".to_string(),
                format!("{lti:.2}"),
                e.to_string(),
            ],
        };
        writer.write_record(&row)?;
    }
    writer.flush()?;
    info!("Wrote {} prediction rows to {}", outcomes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::reference_store;
    use std::io::{self, Write};
    use tempfile::NamedTempFile;

    fn create_test_tsv(content: &str) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{}", content)?;
        file.flush()?;
        Ok(file)
    }

    const HEADER: &str = "applicant_id\tage\tincome\tloan_amount\tloan_tenure_months\tavg_dpd_per_delinquency\tdelinquency_ratio\tcredit_utilization_ratio\tnum_open_accounts\tresidence_type\tloan_purpose\tloan_type";

    #[test]
    fn test_load_and_score_with_one_bad_row() {
        let content = format!(
            "{HEADER}\nA-1\t28\t1200000\t2560000\t36\t20\t30\t30\t2\tOwned\tEducation\tUnsecured\nA-2\t40\t0\t100000\t12\t0\t0\t10\t1\tCondo\tHome\tSecured"
        );
        let file = create_test_tsv(&content).unwrap();
        let records = load_applicants(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].applicant_id.as_deref(), Some("A-1"));

        let outcomes = score_applicants(&reference_store(), &records);
        assert_eq!(outcomes.len(), records.len());
        assert_eq!(outcomes[0].applicant_id, "A-1");
        assert_eq!(outcomes[0].result.as_ref().unwrap().credit_score, 594);
        assert!(matches!(
            outcomes[1].result,
            Err(PredictError::UnknownCategory(_))
        ));

        let out = NamedTempFile::new().unwrap();
        write_predictions(out.path(), &outcomes).unwrap();
        let written = std::fs::read_to_string(out.path()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], OUTPUT_HEADER.join("\t"));

        let good: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(good[3], "594");
        assert_eq!(good[4], "Average");
        assert_eq!(good[6], "Reject");
        assert_eq!(good[7], "2.13");
        assert_eq!(good[8], "");

        let bad: Vec<&str> = lines[2].split('\t').collect();
        assert_eq!(bad[0], "A-2");
        assert_eq!(bad[3], "NA");
        assert_eq!(bad[7], "0.00");
        assert!(bad[8].contains("Condo"));
    }

    #[test]
    fn test_missing_id_column_uses_row_numbers() {
        let header = HEADER.replacen("applicant_id\t", "", 1);
        let content = format!(
            "{header}\n28\t1200000\t2560000\t36\t20\t30\t30\t2\tOwned\tEducation\tUnsecured\n35\t900000\t400000\t24\t5\t10\t40\t3\tRented\tAuto\tSecured"
        );
        let file = create_test_tsv(&content).unwrap();
        let records = load_applicants(file.path()).unwrap();
        let outcomes = score_applicants(&reference_store(), &records);
        let ids: Vec<&str> = outcomes.iter().map(|o| o.applicant_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
    }

    #[test]
    fn test_every_outcome_gets_an_output_row() {
        let row = "28\t1200000\t2560000\t36\t20\t30\t30\t2\tOwned\tEducation\tUnsecured";
        let header = HEADER.replacen("applicant_id\t", "", 1);
        let content = format!(
            "{header}\n{row}\n35\t0\t400000\t24\t5\t10\t40\t3\tOwned\tBoat\tSecured\n{row}"
        );
        let file = create_test_tsv(&content).unwrap();
        let records = load_applicants(file.path()).unwrap();
        let outcomes = score_applicants(&reference_store(), &records);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[1].result.is_err());

        let out = NamedTempFile::new().unwrap();
        write_predictions(out.path(), &outcomes).unwrap();
        let written = std::fs::read_to_string(out.path()).unwrap();
        let ids: Vec<&str> = written
            .lines()
            .skip(1)
            .map(|l| l.split('\t').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(written.lines().nth(3).unwrap().contains("\t2.13\t"));
    }

    #[test]
    fn test_non_numeric_field_is_a_load_error() {
        let content = format!(
            "{HEADER}\nA-1\ttwenty\t1200000\t2560000\t36\t20\t30\t30\t2\tOwned\tEducation\tUnsecured"
        );
        let file = create_test_tsv(&content).unwrap();
        assert!(matches!(
            load_applicants(file.path()),
            Err(BatchError::Csv(_))
        ));
    }
}
