//! Native Ensemble - voting regressor over boosted trees, forests and SVR
//!
//! Mirrors the estimators a scikit-learn `VotingRegressor` combines for OTD
//! forecasting. Parameters come from the artifact; nothing here trains.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::inference::{check_batch, check_outputs, InferenceError, Regressor};
use super::tree::Tree;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

// ============================================================================
// VALIDATION ERROR
// ============================================================================

/// Structural problem in a model definition, with its location
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {reason}")]
pub struct ModelValidationError {
    pub path: String,
    pub reason: String,
}

impl ModelValidationError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { path: path.into(), reason: reason.into() }
    }
}

// ============================================================================
// PREPROCESSING
// ============================================================================

/// `(x - mean) / scale`, as fitted by a standard scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn validate(&self, path: &str) -> Result<(), ModelValidationError> {
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            return Err(ModelValidationError::new(
                path,
                format!("scaler expects {} means and scales", FEATURE_COUNT),
            ));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(ModelValidationError::new(path, "scaler mean is not finite"));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(ModelValidationError::new(path, "scaler scale must be finite and non-zero"));
        }
        Ok(())
    }

    fn transform(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = *x;
        for (i, value) in out.iter_mut().enumerate() {
            *value = (*value - self.mean[i]) / self.scale[i];
        }
        out
    }
}

fn scaled(scaler: &Option<StandardScaler>, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
    match scaler {
        Some(scaler) => scaler.transform(x),
        None => *x,
    }
}

// ============================================================================
// KERNELS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
    Poly { gamma: f64, coef0: f64, degree: u32 },
}

impl Kernel {
    fn apply(&self, a: &[f64], b: &[f64; FEATURE_COUNT]) -> f64 {
        match *self {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { gamma } => {
                let sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
                (-gamma * sq).exp()
            }
            Kernel::Poly { gamma, coef0, degree } => (gamma * dot(a, b) + coef0).powi(degree as i32),
        }
    }

    fn validate(&self, path: &str) -> Result<(), ModelValidationError> {
        match *self {
            Kernel::Linear => Ok(()),
            Kernel::Rbf { gamma } if gamma.is_finite() && gamma > 0.0 => Ok(()),
            Kernel::Poly { gamma, coef0, degree }
                if gamma.is_finite() && coef0.is_finite() && degree > 0 && degree <= 16 => Ok(()),
            _ => Err(ModelValidationError::new(path, format!("invalid kernel parameters {:?}", self))),
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

// ============================================================================
// ESTIMATORS
// ============================================================================

/// One fitted estimator; `Voting` nests the others
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    /// Weighted mean of member predictions (plain mean without weights)
    Voting {
        #[serde(default)]
        weights: Option<Vec<f64>>,
        estimators: Vec<Estimator>,
    },
    /// `base_score + Σ tree(x)`; leaf values already include the learning rate
    GradientBoosting {
        #[serde(default)]
        base_score: f64,
        trees: Vec<Tree>,
    },
    /// Mean of tree outputs
    RandomForest { trees: Vec<Tree> },
    /// `intercept + Σ dual_coef[i] · K(sv[i], x')`
    Svr {
        kernel: Kernel,
        #[serde(default)]
        scaler: Option<StandardScaler>,
        support_vectors: Vec<Vec<f64>>,
        dual_coef: Vec<f64>,
        intercept: f64,
    },
    /// `intercept + coefficients · x'`
    Linear {
        #[serde(default)]
        scaler: Option<StandardScaler>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::Voting { .. } => "voting",
            Estimator::GradientBoosting { .. } => "gradient_boosting",
            Estimator::RandomForest { .. } => "random_forest",
            Estimator::Svr { .. } => "svr",
            Estimator::Linear { .. } => "linear",
        }
    }

    /// Number of base estimators, counting through nested voting
    pub fn leaf_estimator_count(&self) -> usize {
        match self {
            Estimator::Voting { estimators, .. } => {
                estimators.iter().map(Estimator::leaf_estimator_count).sum()
            }
            _ => 1,
        }
    }

    /// Structural checks; `path` locates the estimator inside the artifact
    pub fn validate(&self, path: &str) -> Result<(), ModelValidationError> {
        match self {
            Estimator::Voting { weights, estimators } => {
                if estimators.is_empty() {
                    return Err(ModelValidationError::new(path, "voting ensemble has no estimators"));
                }
                if let Some(weights) = weights {
                    if weights.len() != estimators.len() {
                        return Err(ModelValidationError::new(
                            path,
                            format!("{} weights for {} estimators", weights.len(), estimators.len()),
                        ));
                    }
                    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(ModelValidationError::new(path, "weights must be finite and >= 0"));
                    }
                    if weights.iter().sum::<f64>() <= 0.0 {
                        return Err(ModelValidationError::new(path, "weights sum to zero"));
                    }
                }
                for (i, estimator) in estimators.iter().enumerate() {
                    estimator.validate(&format!("{}.estimators[{}]", path, i))?;
                }
                Ok(())
            }
            Estimator::GradientBoosting { base_score, trees } => {
                if !base_score.is_finite() {
                    return Err(ModelValidationError::new(path, "base_score is not finite"));
                }
                validate_trees(path, trees)
            }
            Estimator::RandomForest { trees } => validate_trees(path, trees),
            Estimator::Svr { kernel, scaler, support_vectors, dual_coef, intercept } => {
                kernel.validate(&format!("{}.kernel", path))?;
                if let Some(scaler) = scaler {
                    scaler.validate(&format!("{}.scaler", path))?;
                }
                if support_vectors.is_empty() {
                    return Err(ModelValidationError::new(path, "no support vectors"));
                }
                if support_vectors.len() != dual_coef.len() {
                    return Err(ModelValidationError::new(
                        path,
                        format!("{} support vectors but {} dual coefficients", support_vectors.len(), dual_coef.len()),
                    ));
                }
                for (i, sv) in support_vectors.iter().enumerate() {
                    if sv.len() != FEATURE_COUNT || sv.iter().any(|v| !v.is_finite()) {
                        return Err(ModelValidationError::new(
                            format!("{}.support_vectors[{}]", path, i),
                            format!("expected {} finite values", FEATURE_COUNT),
                        ));
                    }
                }
                if dual_coef.iter().any(|c| !c.is_finite()) || !intercept.is_finite() {
                    return Err(ModelValidationError::new(path, "coefficients must be finite"));
                }
                Ok(())
            }
            Estimator::Linear { scaler, coefficients, intercept } => {
                if let Some(scaler) = scaler {
                    scaler.validate(&format!("{}.scaler", path))?;
                }
                if coefficients.len() != FEATURE_COUNT {
                    return Err(ModelValidationError::new(
                        path,
                        format!("expected {} coefficients, got {}", FEATURE_COUNT, coefficients.len()),
                    ));
                }
                if coefficients.iter().any(|c| !c.is_finite()) || !intercept.is_finite() {
                    return Err(ModelValidationError::new(path, "coefficients must be finite"));
                }
                Ok(())
            }
        }
    }

    /// Predict one row; assumes [`Estimator::validate`] passed
    pub fn predict_row(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        match self {
            Estimator::Voting { weights, estimators } => match weights {
                Some(weights) => {
                    let total: f64 = weights.iter().sum();
                    estimators
                        .iter()
                        .zip(weights.iter())
                        .map(|(e, w)| w * e.predict_row(x))
                        .sum::<f64>()
                        / total
                }
                None => {
                    estimators.iter().map(|e| e.predict_row(x)).sum::<f64>() / estimators.len() as f64
                }
            },
            Estimator::GradientBoosting { base_score, trees } => {
                base_score + trees.iter().map(|t| t.predict(x)).sum::<f64>()
            }
            Estimator::RandomForest { trees } => {
                trees.iter().map(|t| t.predict(x)).sum::<f64>() / trees.len() as f64
            }
            Estimator::Svr { kernel, scaler, support_vectors, dual_coef, intercept } => {
                let x = scaled(scaler, x);
                intercept
                    + support_vectors
                        .iter()
                        .zip(dual_coef.iter())
                        .map(|(sv, c)| c * kernel.apply(sv, &x))
                        .sum::<f64>()
            }
            Estimator::Linear { scaler, coefficients, intercept } => {
                let x = scaled(scaler, x);
                intercept + dot(coefficients, &x)
            }
        }
    }
}

fn validate_trees(path: &str, trees: &[Tree]) -> Result<(), ModelValidationError> {
    if trees.is_empty() {
        return Err(ModelValidationError::new(path, "no trees"));
    }
    for (i, tree) in trees.iter().enumerate() {
        tree.validate(&format!("{}.trees[{}]", path, i))?;
    }
    Ok(())
}

// ============================================================================
// REGRESSOR ADAPTER
// ============================================================================

/// A validated estimator tree behind the [`Regressor`] interface
///
/// Pure reads after construction, so it is shared across threads unguarded.
#[derive(Debug, Clone)]
pub struct NativeEnsemble {
    root: Estimator,
}

impl NativeEnsemble {
    pub fn new(root: Estimator) -> Result<Self, ModelValidationError> {
        root.validate("model")?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Estimator {
        &self.root
    }
}

impl Regressor for NativeEnsemble {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        check_batch(batch)?;
        let outputs: Vec<f64> = batch.iter().map(|row| self.root.predict_row(&row.values)).collect();
        check_outputs(batch.len(), &outputs)?;
        Ok(outputs)
    }

    fn kind(&self) -> &str {
        self.root.kind()
    }
}
