// ========================================================================================
//
//                               THE MODEL STORE
//
// ========================================================================================
//
// Owns the frozen model for the lifetime of the process. Construction is the only place
// where anything is mutated: the artifact is validated against the feature builder's
// vocabulary, every feature name is resolved to a raw-layout position, and the
// coefficients and intercept are tempered once. After that the store is read-only and
// may be shared freely across threads.

use crate::features::{self, FeatureVector, RawFeatures};
use crate::model::artifact::{ModelArtifact, ModelLoadError};
use crate::model::scaler::FittedScaler;
use crate::scorer::{self, ScoreResult, ScoringError};
use crate::types::ApplicantInput;
use log::{debug, error, info, warn};
use ndarray::{Array1, ArrayView1};
use once_cell::sync::OnceCell;
use std::env;
use std::path::{Path, PathBuf};

/// Coefficients and intercept are divided by this once at load, flattening the logistic
/// curve and softening the model's confidence.
pub const TEMPERATURE: f64 = 10.0;

/// Environment variable naming the artifact to load when no explicit path is given.
pub const MODEL_PATH_ENV: &str = "LAUKI_MODEL_PATH";

/// Artifact location searched relative to the working directory, then the executable.
pub const DEFAULT_ARTIFACT_PATH: &str = "artifacts/model_data.toml";

#[derive(Debug, Clone)]
pub struct ModelStore {
    coefficients: Array1<f64>,
    intercept: f64,
    feature_order: Vec<String>,
    scale_subset: Vec<String>,
    scaler: FittedScaler,
    /// Raw-layout position of each model feature, in `feature_order` order.
    selection: Vec<usize>,
    /// Raw-layout position of each scaled column, in `scale_subset` order.
    scale_positions: Vec<usize>,
    source: Option<PathBuf>,
}

impl ModelStore {
    /// Reads, validates and tempers the artifact at `path`.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        info!("Loading credit-risk model from {}", path.display());
        let artifact = ModelArtifact::load(path)?;
        let mut store = Self::from_artifact(artifact)?;
        store.source = Some(path.to_path_buf());
        Ok(store)
    }

    /// Builds a store from an in-memory artifact. Temperature scaling happens here and
    /// nowhere else.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelLoadError> {
        artifact.validate()?;

        let selection = resolve_positions("features", &artifact.features)?;
        let scale_positions = resolve_positions("cols_to_scale", &artifact.cols_to_scale)?;
        let scaler = FittedScaler::from_params(&artifact.scaler)?;

        let placeholders: Vec<&str> = artifact
            .features
            .iter()
            .map(String::as_str)
            .filter(|name| features::is_placeholder(name))
            .collect();
        if !placeholders.is_empty() {
            warn!(
                "Model consumes {} constant placeholder column(s): {}",
                placeholders.len(),
                placeholders.join(", ")
            );
        }

        let coefficients = Array1::from(artifact.model.coefficients) / TEMPERATURE;
        let intercept = artifact.model.intercept / TEMPERATURE;

        info!(
            "Model ready: {} features, {} scaled columns ({:?} scaler), temperature {}",
            artifact.features.len(),
            artifact.cols_to_scale.len(),
            scaler.kind(),
            TEMPERATURE
        );

        Ok(Self {
            coefficients,
            intercept,
            feature_order: artifact.features,
            scale_subset: artifact.cols_to_scale,
            scaler,
            selection,
            scale_positions,
            source: None,
        })
    }

    /// Tempered coefficients, aligned with `feature_order`.
    pub fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.coefficients.view()
    }

    /// Tempered intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn feature_order(&self) -> &[String] {
        &self.feature_order
    }

    pub fn scale_subset(&self) -> &[String] {
        &self.scale_subset
    }

    /// The file this store was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Applies the fitted scaler to exactly the scale-subset columns of `raw`.
    pub fn scale(&self, mut raw: RawFeatures) -> RawFeatures {
        let values = raw.as_mut_slice();
        for (column, &pos) in self.scale_positions.iter().enumerate() {
            values[pos] = self.scaler.transform_one(column, values[pos]);
        }
        raw
    }

    pub(crate) fn select(&self, raw: &RawFeatures) -> FeatureVector {
        let values = raw.as_slice();
        FeatureVector::new(self.selection.iter().map(|&pos| values[pos]).collect())
    }

    /// Scores one applicant: feature building followed by the scorer.
    pub fn predict(&self, input: &ApplicantInput) -> Result<ScoreResult, ScoringError> {
        let prepared = features::build_features(self, input);
        let result = scorer::score(self, &prepared).inspect_err(|e| {
            if let ScoringError::NonFinite { .. } = e {
                error!("Applicant input that produced a non-finite score: {input:?}");
            }
        })?;
        debug!(
            "Scored applicant: probability {:.4}, score {}, rating {}",
            result.default_probability, result.credit_score, result.rating
        );
        Ok(result)
    }
}

fn resolve_positions(list: &'static str, names: &[String]) -> Result<Vec<usize>, ModelLoadError> {
    names
        .iter()
        .map(|name| {
            features::position(name).ok_or_else(|| ModelLoadError::UnknownFeature {
                list,
                name: name.clone(),
            })
        })
        .collect()
}

/// Picks the artifact to load.
///
/// Order: `explicit`, then `$LAUKI_MODEL_PATH`, then `artifacts/model_data.toml` under the
/// working directory, then the same relative path next to the running executable.
pub fn resolve_artifact_path(explicit: Option<&Path>) -> Result<PathBuf, ModelLoadError> {
    let from_env = env::var_os(MODEL_PATH_ENV).map(PathBuf::from);
    let mut fallbacks = vec![PathBuf::from(DEFAULT_ARTIFACT_PATH)];
    if let Some(dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        fallbacks.push(dir.join(DEFAULT_ARTIFACT_PATH));
    }
    resolve_with(explicit.map(Path::to_path_buf), from_env, &fallbacks)
}

fn resolve_with(
    explicit: Option<PathBuf>,
    from_env: Option<PathBuf>,
    fallbacks: &[PathBuf],
) -> Result<PathBuf, ModelLoadError> {
    // A path the operator named is never silently swapped for a default.
    if let Some(path) = explicit.or(from_env) {
        return if path.is_file() {
            Ok(path)
        } else {
            Err(ModelLoadError::NotFound {
                searched: vec![path],
            })
        };
    }
    fallbacks
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| ModelLoadError::NotFound {
            searched: fallbacks.to_vec(),
        })
}

static GLOBAL_STORE: OnceCell<ModelStore> = OnceCell::new();

/// Loads the process-wide store on first call and returns it on every later call.
///
/// Loading runs at most once even under concurrent first calls. A failed load leaves the
/// cell empty so a later call can retry.
pub fn init_global(explicit: Option<&Path>) -> Result<&'static ModelStore, ModelLoadError> {
    let store = GLOBAL_STORE.get_or_try_init(|| {
        let path = resolve_artifact_path(explicit)?;
        ModelStore::load(&path)
    })?;
    if let (Some(requested), Some(loaded)) = (explicit, store.source()) {
        if requested != loaded {
            warn!(
                "Model already loaded from {}; ignoring request for {}",
                loaded.display(),
                requested.display()
            );
        }
    }
    Ok(store)
}

/// The process-wide store, loaded lazily from the default location.
pub fn global() -> Result<&'static ModelStore, ModelLoadError> {
    init_global(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{reference_artifact, reference_artifact_path, simple_artifact};
    use approx::assert_abs_diff_eq;
    use tempfile::NamedTempFile;

    #[test]
    fn test_temperature_applied_exactly_once() {
        let artifact = reference_artifact();
        let store = ModelStore::from_artifact(artifact.clone()).unwrap();

        assert_abs_diff_eq!(store.intercept(), artifact.model.intercept / 10.0, epsilon = 1e-15);
        for (tempered, &original) in store.coefficients().iter().zip(&artifact.model.coefficients) {
            assert_abs_diff_eq!(*tempered, original / TEMPERATURE, epsilon = 1e-15);
        }

        // Scoring must not touch the parameters.
        let before = store.coefficients().to_owned();
        let _ = store.predict(&crate::test_fixtures::baseline_input()).unwrap();
        assert_eq!(store.coefficients(), before.view());
    }

    #[test]
    fn test_exposes_orders_from_artifact() {
        let artifact = reference_artifact();
        let store = ModelStore::from_artifact(artifact.clone()).unwrap();
        assert_eq!(store.feature_order(), artifact.features.as_slice());
        assert_eq!(store.scale_subset(), artifact.cols_to_scale.as_slice());
        assert!(store.source().is_none());
    }

    #[test]
    fn test_load_records_source() {
        let path = reference_artifact_path();
        let store = ModelStore::load(&path).unwrap();
        assert_eq!(store.source(), Some(path.as_path()));
    }

    #[test]
    fn test_unknown_feature_names_rejected() {
        let artifact = simple_artifact(&["age", "credit_score_bureau"], &[1.0, 1.0], &[]);
        match ModelStore::from_artifact(artifact) {
            Err(ModelLoadError::UnknownFeature { list, name }) => {
                assert_eq!(list, "features");
                assert_eq!(name, "credit_score_bureau");
            }
            other => panic!("Expected UnknownFeature, got {other:?}"),
        }

        let artifact = simple_artifact(&["age"], &[1.0], &["income"]);
        assert!(matches!(
            ModelStore::from_artifact(artifact),
            Err(ModelLoadError::UnknownFeature { list: "cols_to_scale", .. })
        ));
    }

    #[test]
    fn test_scale_touches_only_subset() {
        let mut artifact = simple_artifact(&["age", "loan_tenure_months"], &[1.0, 1.0], &["age"]);
        artifact.scaler.center = vec![18.0];
        artifact.scaler.scale = vec![52.0];
        let store = ModelStore::from_artifact(artifact).unwrap();

        let raw = RawFeatures::from_input(&crate::test_fixtures::baseline_input());
        let scaled = store.scale(raw.clone());
        assert_abs_diff_eq!(scaled.get("age").unwrap(), 10.0 / 52.0, epsilon = 1e-12);
        for name in features::RAW_FEATURE_NAMES.iter().filter(|&&n| n != "age") {
            assert_eq!(scaled.get(name), raw.get(name), "{name}");
        }
    }

    #[test]
    fn test_resolution_prefers_explicit_then_env_then_fallbacks() {
        let explicit = NamedTempFile::new().unwrap();
        let env_file = NamedTempFile::new().unwrap();
        let fallback = NamedTempFile::new().unwrap();
        let missing = PathBuf::from("/no/such/model_data.toml");
        let fallbacks = vec![missing.clone(), fallback.path().to_path_buf()];

        let chosen = resolve_with(
            Some(explicit.path().to_path_buf()),
            Some(env_file.path().to_path_buf()),
            &fallbacks,
        )
        .unwrap();
        assert_eq!(chosen, explicit.path());

        let chosen = resolve_with(None, Some(env_file.path().to_path_buf()), &fallbacks).unwrap();
        assert_eq!(chosen, env_file.path());

        let chosen = resolve_with(None, None, &fallbacks).unwrap();
        assert_eq!(chosen, fallback.path());
    }

    #[test]
    fn test_resolution_never_falls_back_from_a_named_path() {
        let fallback = NamedTempFile::new().unwrap();
        let missing = PathBuf::from("/no/such/model_data.toml");
        let err = resolve_with(
            Some(missing.clone()),
            None,
            &[fallback.path().to_path_buf()],
        )
        .unwrap_err();
        match err {
            ModelLoadError::NotFound { searched } => assert_eq!(searched, vec![missing]),
            other => panic!("Expected NotFound, got {other:?}"),
        }

        let err = resolve_with(None, None, &[PathBuf::from("/no/such/a.toml")]).unwrap_err();
        assert!(err.to_string().contains("/no/such/a.toml"));
    }

    #[test]
    fn test_concurrent_first_calls_share_one_store() {
        let path = reference_artifact_path();
        let addresses: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| init_global(Some(&path)).map(|s| s as *const _ as usize)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(addresses[0], global().unwrap() as *const _ as usize);
    }

    #[test]
    fn test_non_finite_score_is_reported_not_panicked() {
        let store = ModelStore::from_artifact(reference_artifact()).unwrap();
        let mut input = crate::test_fixtures::baseline_input();
        input.age = u32::MAX;
        input.loan_amount = 1e300;
        input.income = 1e-300;
        assert!(matches!(
            store.predict(&input),
            Err(ScoringError::NonFinite { .. })
        ));
    }
}
