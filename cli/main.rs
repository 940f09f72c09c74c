#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use lauki::batch::{load_applicants, score_applicants, write_predictions};
use lauki::model::{self, ModelStore};
use lauki::{ApplicantInput, ApplicantRecord};

#[derive(Args)]
pub struct PredictArgs {
    /// Applicant age in years
    #[arg(long, default_value_t = 28, value_parser = clap::value_parser!(u32).range(18..=100))]
    pub age: u32,

    /// Annual income
    #[arg(long, default_value_t = 1_200_000.0)]
    pub income: f64,

    /// Requested loan amount
    #[arg(long, default_value_t = 2_560_000.0)]
    pub loan_amount: f64,

    /// Loan tenure in months
    #[arg(long, default_value_t = 36)]
    pub tenure: u32,

    /// Average days past due per delinquency event
    #[arg(long, default_value_t = 20)]
    pub avg_dpd: u32,

    /// Delinquency ratio in percent (0-100)
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub delinquency_ratio: u32,

    /// Credit utilization in percent (0-100)
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub credit_utilization: u32,

    /// Number of open credit accounts
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub open_accounts: u32,

    /// Residence type: Owned, Rented or Mortgage
    #[arg(long, default_value = "Owned")]
    pub residence_type: String,

    /// Loan purpose: Education, Home, Auto or Personal
    #[arg(long, default_value = "Education")]
    pub loan_purpose: String,

    /// Loan type: Unsecured or Secured
    #[arg(long, default_value = "Unsecured")]
    pub loan_type: String,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Path to a TSV file with one applicant per row
    pub applicants: PathBuf,

    /// Where to write the scored rows
    #[arg(long, default_value = "predictions.tsv")]
    pub output: PathBuf,
}

#[derive(Parser)]
#[command(
    name = "lauki",
    version,
    about = "Credit-risk scoring: default probability, credit score and rating tier."
)]
pub struct Cli {
    /// Path to the model artifact (.toml). Falls back to $LAUKI_MODEL_PATH, then
    /// artifacts/model_data.toml.
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a single applicant
    #[command(about = "Score a single applicant")]
    Predict(PredictArgs),

    /// Score every applicant in a TSV file
    #[command(about = "Score applicants from a TSV file (outputs: predictions.tsv)")]
    Batch(BatchArgs),

    /// Print the loaded model's tempered parameters
    #[command(about = "Print the loaded model's tempered parameters")]
    Inspect,

    /// Display version information
    #[command(about = "Display version information")]
    Version,
}

fn load_store(path: Option<&Path>) -> Result<&'static ModelStore, Box<dyn std::error::Error>> {
    let store = model::init_global(path)?;
    if let Some(source) = store.source() {
        println!("Model loaded from: {}", source.display());
    }
    Ok(store)
}

pub fn predict(
    model_path: Option<&Path>,
    args: PredictArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = ApplicantRecord {
        applicant_id: None,
        age: args.age,
        income: args.income,
        loan_amount: args.loan_amount,
        loan_tenure_months: args.tenure,
        avg_dpd_per_delinquency: args.avg_dpd,
        delinquency_ratio: f64::from(args.delinquency_ratio),
        credit_utilization_ratio: f64::from(args.credit_utilization),
        num_open_accounts: args.open_accounts,
        residence_type: args.residence_type,
        loan_purpose: args.loan_purpose,
        loan_type: args.loan_type,
    };
    let input = ApplicantInput::try_from(&record)?;
    println!("Loan-to-income ratio: {:.2}", input.loan_to_income());

    let store = load_store(model_path)?;
    let result = store.predict(&input)?;

    println!("Default probability:     {:.2}%", result.default_probability * 100.0);
    println!("Safety score:            {:.2}%", result.safety_score() * 100.0);
    println!("Credit score:            {}", result.credit_score);
    println!("Rating:                  {}", result.rating);
    println!("Projected interest rate: {:.2}%", result.projected_interest_rate());
    println!("Recommendation:          {}", result.recommendation());
    Ok(())
}

pub fn batch(
    model_path: Option<&Path>,
    args: BatchArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(model_path)?;

    println!("Loading applicants from: {}", args.applicants.display());
    let records = load_applicants(&args.applicants)?;
    println!("Loaded {} applicants", records.len());

    let outcomes = score_applicants(store, &records);
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();

    write_predictions(&args.output, &outcomes)?;
    println!(
        "Scored {} of {} applicants ({} rejected as invalid)",
        outcomes.len() - failed,
        outcomes.len(),
        failed
    );
    println!("Predictions saved to: {}", args.output.display());
    Ok(())
}

pub fn inspect(model_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(model_path)?;
    println!("Temperature: {}", model::TEMPERATURE);
    println!("Intercept (tempered): {}", store.intercept());
    println!("feature\tcoefficient\tscaled");
    for (name, coefficient) in store.feature_order().iter().zip(store.coefficients().iter()) {
        let scaled = store.scale_subset().contains(name);
        println!("{name}\t{coefficient}\t{scaled}");
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Cli { model, command } = Cli::parse();
    let model_path = model.as_deref();

    let result = match command {
        Some(Commands::Predict(args)) => predict(model_path, args),
        Some(Commands::Batch(args)) => batch(model_path, args),
        Some(Commands::Inspect) => inspect(model_path),
        Some(Commands::Version) => {
            println!("lauki {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => Cli::command()
            .print_help()
            .map(|()| println!())
            .map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
