//! Predictor - request → feature vector → model → whole days
//!
//! Stateless apart from the shared handle: each call builds its own vector,
//! invokes the model with a batch of one and rounds the first output.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::features::{FeatureVector, MissingFieldError, PredictionRequest};
use super::model::{InferenceError, ModelHandle};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error(transparent)]
    MissingField(#[from] MissingFieldError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

// ============================================================================
// RESULT
// ============================================================================

/// Estimated delivery time for one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Whole days, never negative
    pub days: u32,
    /// Unrounded model output
    pub raw: f64,
    pub inference_time_us: u64,
    pub model: String,
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Estimated Delivery Time: {} days", self.days)
    }
}

// ============================================================================
// PREDICTOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct Predictor {
    handle: Arc<ModelHandle>,
}

impl Predictor {
    pub fn new(handle: Arc<ModelHandle>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }

    /// Estimate the delivery time of one order
    ///
    /// A request with absent fields fails before the model is touched.
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictError> {
        let vector = FeatureVector::build(request)?;
        log::debug!("Predicting for {}", vector.to_log_entry());

        let start = Instant::now();
        let outputs = self.handle.predict(std::slice::from_ref(&vector))?;
        let inference_time_us = start.elapsed().as_micros() as u64;

        let raw = *outputs
            .first()
            .ok_or(InferenceError::BatchSize { expected: 1, actual: 0 })?;
        let days = round_days(raw)?;

        log::debug!("Raw output {:.4} → {} day(s) in {}µs", raw, days, inference_time_us);

        Ok(PredictionResult {
            days,
            raw,
            inference_time_us,
            model: self.handle.metadata().name.clone(),
        })
    }
}

/// Round a raw regression output to whole days
///
/// Ties go to the even neighbour (4.5 → 4, 5.5 → 6). Negative outputs clamp
/// to 0.
pub fn round_days(raw: f64) -> Result<u32, InferenceError> {
    if !raw.is_finite() {
        return Err(InferenceError::NonFiniteOutput(raw));
    }

    let rounded = raw.round_ties_even();
    if rounded < 0.0 {
        log::warn!("Model produced a negative delivery time ({:.4}); clamping to 0", raw);
        return Ok(0);
    }
    if rounded > f64::from(u32::MAX) {
        return Err(InferenceError::OutOfRange(raw));
    }

    Ok(rounded as u32)
}
