//! Deterministic test models
//!
//! A hand-sized voting ensemble whose output can be worked out on paper, plus
//! stub regressors for the failure paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::ensemble::{Estimator, Kernel};
use super::handle::ModelHandle;
use super::inference::{InferenceError, Regressor};
use super::tree::Tree;
use crate::logic::features::{FeatureVector, PredictionRequest, FEATURE_COUNT};

/// Voting over three members:
/// - boosting: `10 + (distance <= 100 ? -2 : 3)`
/// - forest: mean of `(weight <= 5000 ? 8 : 12)` and `10`
/// - linear SVR: `8 + 0.01 * distance`
pub fn fixture_ensemble() -> Estimator {
    let mut sv = vec![0.0; FEATURE_COUNT];
    sv[7] = 0.01;

    Estimator::Voting {
        weights: None,
        estimators: vec![
            Estimator::GradientBoosting {
                base_score: 10.0,
                trees: vec![Tree::stump(7, 100.0, -2.0, 3.0)],
            },
            Estimator::RandomForest {
                trees: vec![Tree::stump(4, 5000.0, 8.0, 12.0), Tree::leaf(10.0)],
            },
            Estimator::Svr {
                kernel: Kernel::Linear,
                scaler: None,
                support_vectors: vec![sv],
                dual_coef: vec![1.0],
                intercept: 8.0,
            },
        ],
    }
}

/// First row of the reference table
pub fn scenario_one() -> PredictionRequest {
    PredictionRequest::new(0, 6, 2018, 37206.0, 16250.0, 25, 20, 247.94)
}

/// Fixture output for [`scenario_one`]: (13 + 11 + 10.4794) / 3 → 11
pub const SCENARIO_ONE_DAYS: u32 = 11;

/// Returns the same raw value for every row and counts calls
pub struct FixedRegressor {
    pub value: f64,
    pub calls: Arc<AtomicUsize>,
}

impl FixedRegressor {
    pub fn new(value: f64) -> Self {
        Self { value, calls: Arc::new(AtomicUsize::new(0)) }
    }
}

impl Regressor for FixedRegressor {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.value; batch.len()])
    }

    fn kind(&self) -> &str {
        "fixed"
    }
}

/// Fails whenever the distance feature is above a limit
pub struct FlakyOnDistance {
    pub limit: f64,
}

impl Regressor for FlakyOnDistance {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        batch
            .iter()
            .map(|row| {
                if row.values[7] > self.limit {
                    Err(InferenceError::Backend("shape mismatch".to_string()))
                } else {
                    Ok(row.values[7] / 100.0)
                }
            })
            .collect()
    }

    fn kind(&self) -> &str {
        "flaky"
    }
}

/// Returns a batch of the wrong size
pub struct EmptyOutput;

impl Regressor for EmptyOutput {
    fn predict(&self, _batch: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        Ok(Vec::new())
    }

    fn kind(&self) -> &str {
        "empty"
    }
}

pub fn handle_for(regressor: impl Regressor + 'static) -> Arc<ModelHandle> {
    Arc::new(ModelHandle::from_regressor(Box::new(regressor), "fixture"))
}
