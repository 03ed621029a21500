//! Inference Contract - the Regressor capability
//!
//! Whatever the artifact holds (native ensemble, ONNX graph, test stub), it is
//! adapted to [`Regressor`] at the load boundary. Nothing downstream knows
//! which backend is answering.

use thiserror::Error;

use crate::logic::features::layout::{feature_name, LayoutMismatchError};
use crate::logic::features::FeatureVector;

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// The model invocation failed for this batch
///
/// Deterministic for a given input: retrying the same batch fails the same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("feature {feature} is not a finite number ({value})")]
    NonFiniteInput { feature: &'static str, value: f64 },

    #[error(transparent)]
    LayoutMismatch(#[from] LayoutMismatchError),

    #[error("model returned a non-finite value ({0})")]
    NonFiniteOutput(f64),

    #[error("model returned {actual} value(s) for a batch of {expected}")]
    BatchSize { expected: usize, actual: usize },

    #[error("model output {0} is out of range for a day count")]
    OutOfRange(f64),

    #[error("inference backend failed: {0}")]
    Backend(String),
}

// ============================================================================
// REGRESSOR TRAIT
// ============================================================================

/// Trait for regression backends
///
/// Implementations must be safe for concurrent read-only use; a backend that
/// mutates during inference serializes internally.
pub trait Regressor: Send + Sync {
    /// One output per input row, in input order
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, InferenceError>;

    /// Short backend name for status and logs ("voting", "onnx", ...)
    fn kind(&self) -> &str;
}

/// Reject rows built against another layout or holding NaN/inf
pub fn check_batch(batch: &[FeatureVector]) -> Result<(), InferenceError> {
    for row in batch {
        row.validate()?;
        if let Some((i, &value)) = row.values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(InferenceError::NonFiniteInput {
                feature: feature_name(i).unwrap_or("?"),
                value,
            });
        }
    }
    Ok(())
}

/// Reject output batches of the wrong length or holding NaN/inf
pub fn check_outputs(expected: usize, outputs: &[f64]) -> Result<(), InferenceError> {
    if outputs.len() != expected {
        return Err(InferenceError::BatchSize { expected, actual: outputs.len() });
    }
    if let Some(&bad) = outputs.iter().find(|v| !v.is_finite()) {
        return Err(InferenceError::NonFiniteOutput(bad));
    }
    Ok(())
}
