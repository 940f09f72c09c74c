use crate::model::artifact::{ModelLoadError, ScalerKind, ScalerParams};
use ndarray::Array1;

/// A fitted per-column affine transform, `x' = (x - center) / scale`.
///
/// Columns are positional: column `i` is the `i`-th entry of the scale subset the scaler
/// was fit on.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedScaler {
    kind: ScalerKind,
    center: Array1<f64>,
    scale: Array1<f64>,
}

impl FittedScaler {
    pub fn from_params(params: &ScalerParams) -> Result<Self, ModelLoadError> {
        if params.center.len() != params.scale.len() {
            return Err(ModelLoadError::ScalerShapeMismatch {
                parameter: "scale",
                found: params.scale.len(),
                expected: params.center.len(),
            });
        }
        Ok(Self {
            kind: params.kind,
            center: Array1::from(params.center.clone()),
            scale: Array1::from(params.scale.clone()),
        })
    }

    pub fn kind(&self) -> ScalerKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.center.len()
    }

    pub fn is_empty(&self) -> bool {
        self.center.is_empty()
    }

    /// Transforms a single value belonging to column `column`.
    #[inline]
    pub fn transform_one(&self, column: usize, value: f64) -> f64 {
        (value - self.center[column]) / self.scale[column]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_min_max_transform() {
        let scaler = FittedScaler::from_params(&ScalerParams {
            kind: ScalerKind::MinMax,
            center: vec![18.0, 0.0],
            scale: vec![52.0, 69.0],
        })
        .unwrap();

        assert_abs_diff_eq!(scaler.transform_one(0, 28.0), 10.0 / 52.0, epsilon = 1e-12);
        assert_abs_diff_eq!(scaler.transform_one(1, 20.0), 20.0 / 69.0, epsilon = 1e-12);
        assert_eq!(scaler.transform_one(0, 70.0), 1.0);
        assert_eq!(scaler.len(), 2);
        assert_eq!(scaler.kind(), ScalerKind::MinMax);
    }

    #[test]
    fn test_mismatched_params_rejected() {
        let err = FittedScaler::from_params(&ScalerParams {
            kind: ScalerKind::Standard,
            center: vec![1.0, 2.0],
            scale: vec![1.0],
        })
        .unwrap_err();
        assert!(matches!(err, ModelLoadError::ScalerShapeMismatch { .. }));
    }
}
