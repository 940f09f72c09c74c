//! # Model Artifact
//!
//! The persisted, human-readable form of a trained credit-risk model. The artifact is a
//! TOML document with exactly four top-level entries:
//!
//! - `features`: the ordered feature names the coefficient vector is aligned with.
//! - `cols_to_scale`: the ordered feature names the scaler parameters are aligned with.
//! - `[model]`: the one designated linear model table.
//! - `[scaler]`: the one designated scaler table.
//!
//! Every entry is required. A missing entry is reported by name instead of falling back
//! to a guess about which part of the document holds the coefficients.
//!
//! Parameters are stored exactly as training produced them. Temperature scaling is a
//! load-time concern of `ModelStore`, never baked into the file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The family of the designated model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Binary logistic regression: `p = sigmoid(x · coefficients + intercept)`.
    LogisticRegression,
}

/// How the scaler's `center`/`scale` were fit. Both apply `(x - center) / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// `center` is the training minimum and `scale` the training range.
    MinMax,
    /// `center` is the training mean and `scale` the training standard deviation.
    Standard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelParams {
    pub kind: ModelKind,
    pub intercept: f64,
    /// One coefficient per entry of `ModelArtifact::features`, in the same order.
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub kind: ScalerKind,
    /// One entry per entry of `ModelArtifact::cols_to_scale`, in the same order.
    pub center: Vec<f64>,
    pub scale: Vec<f64>,
}

/// A complete, shape-checked model artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelArtifact {
    pub features: Vec<String>,
    pub cols_to_scale: Vec<String>,
    pub model: LinearModelParams,
    pub scaler: ScalerParams,
}

/// Everything that can go wrong while locating, reading or validating a model.
/// All variants are fatal: a process without a model cannot serve predictions.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("No model artifact found. Searched: {}", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },
    #[error("Failed to read or write model artifact '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML model artifact: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model artifact to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Model artifact is missing the required entry '{0}'.")]
    MissingField(&'static str),
    #[error("Model has {coefficients} coefficients, but the artifact lists {features} features.")]
    CoefficientCountMismatch { coefficients: usize, features: usize },
    #[error(
        "Scaler parameter '{parameter}' has {found} entries, but {expected} columns are marked for scaling."
    )]
    ScalerShapeMismatch {
        parameter: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("Feature '{name}' listed in '{list}' is not produced by the feature builder.")]
    UnknownFeature { list: &'static str, name: String },
    #[error("Feature '{name}' appears more than once in '{list}'.")]
    DuplicateFeature { list: &'static str, name: String },
    #[error("Non-finite value (NaN or Infinity) found in model parameter '{0}'.")]
    NonFiniteParameter(String),
    #[error("Scaler has a zero or negative scale for column '{0}'.")]
    InvalidScale(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The on-disk shape, with every top-level entry optional so absence can be named.
#[derive(Debug, Deserialize)]
struct RawArtifact {
    features: Option<Vec<String>>,
    cols_to_scale: Option<Vec<String>>,
    model: Option<LinearModelParams>,
    scaler: Option<ScalerParams>,
}

impl ModelArtifact {
    /// Loads and shape-checks an artifact from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let toml_string = fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&toml_string)
    }

    pub fn from_toml_str(toml_string: &str) -> Result<Self, ModelLoadError> {
        let raw: RawArtifact = toml::from_str(toml_string)?;
        let artifact = ModelArtifact {
            features: raw.features.ok_or(ModelLoadError::MissingField("features"))?,
            cols_to_scale: raw
                .cols_to_scale
                .ok_or(ModelLoadError::MissingField("cols_to_scale"))?,
            model: raw.model.ok_or(ModelLoadError::MissingField("model"))?,
            scaler: raw.scaler.ok_or(ModelLoadError::MissingField("scaler"))?,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Saves the artifact in the same TOML layout `load` reads.
    pub fn save(&self, path: &Path) -> Result<(), ModelLoadError> {
        self.validate()?;
        let toml_string = toml::to_string_pretty(self)?;
        let io_err = |source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = BufWriter::new(fs::File::create(path).map_err(io_err)?);
        file.write_all(toml_string.as_bytes()).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        Ok(())
    }

    /// Structural checks that need no knowledge of the feature builder.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        check_unique("features", &self.features)?;
        check_unique("cols_to_scale", &self.cols_to_scale)?;

        if self.model.coefficients.len() != self.features.len() {
            return Err(ModelLoadError::CoefficientCountMismatch {
                coefficients: self.model.coefficients.len(),
                features: self.features.len(),
            });
        }
        for (parameter, values) in [
            ("center", &self.scaler.center),
            ("scale", &self.scaler.scale),
        ] {
            if values.len() != self.cols_to_scale.len() {
                return Err(ModelLoadError::ScalerShapeMismatch {
                    parameter,
                    found: values.len(),
                    expected: self.cols_to_scale.len(),
                });
            }
        }

        if !self.model.intercept.is_finite() {
            return Err(ModelLoadError::NonFiniteParameter("intercept".to_string()));
        }
        for (name, &c) in self.features.iter().zip(&self.model.coefficients) {
            if !c.is_finite() {
                return Err(ModelLoadError::NonFiniteParameter(format!(
                    "coefficients[{name}]"
                )));
            }
        }
        for ((name, &center), &scale) in self
            .cols_to_scale
            .iter()
            .zip(&self.scaler.center)
            .zip(&self.scaler.scale)
        {
            if !center.is_finite() {
                return Err(ModelLoadError::NonFiniteParameter(format!("center[{name}]")));
            }
            if !scale.is_finite() {
                return Err(ModelLoadError::NonFiniteParameter(format!("scale[{name}]")));
            }
            if scale <= 0.0 {
                return Err(ModelLoadError::InvalidScale(name.clone()));
            }
        }
        Ok(())
    }
}

fn check_unique(list: &'static str, names: &[String]) -> Result<(), ModelLoadError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ModelLoadError::DuplicateFeature {
                list,
                name: name.clone(),
            });
        }
    }
    Ok(())
}
