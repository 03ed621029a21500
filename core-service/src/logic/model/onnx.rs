//! ONNX Backend - ONNX Runtime integration (cargo feature `onnx`)
//!
//! For ensembles exported with skl2onnx / onnxmltools. The graph takes a
//! `[batch, 8]` f32 tensor and yields one value per row on its first output.

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::artifact::{decompress, ArtifactLoadError};
use super::inference::{check_batch, check_outputs, InferenceError, Regressor};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

/// ONNX session behind the [`Regressor`] interface
///
/// `Session::run` needs `&mut`, so concurrent predictions serialize on the
/// mutex.
pub struct OnnxRegressor {
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxRegressor {
    /// Build a session from raw (optionally gzipped) model bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactLoadError> {
        let model_bytes = decompress(bytes)?;
        log::info!("Loading ONNX model from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| ArtifactLoadError::Unsupported(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ArtifactLoadError::Unsupported(format!("optimization: {}", e)))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| ArtifactLoadError::Corrupt(format!("onnx: {}", e)))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ArtifactLoadError::Incompatible("ONNX graph defines no output".to_string()))?;

        log::info!("ONNX model loaded, reading output {:?}", output_name);

        Ok(Self { session: Mutex::new(session), output_name })
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        check_batch(batch)?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut input_data = Vec::with_capacity(batch.len() * FEATURE_COUNT);
        for row in batch {
            input_data.extend(row.values.iter().map(|&v| v as f32));
        }

        let input_array = Array2::<f32>::from_shape_vec((batch.len(), FEATURE_COUNT), input_data)
            .map_err(|e| InferenceError::Backend(format!("array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError::Backend(format!("tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Backend(format!("inference failed: {}", e)))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| InferenceError::Backend("no output".to_string()))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Backend(format!("extract error: {}", e)))?;

        let values: Vec<f64> = data.iter().map(|&v| f64::from(v)).collect();
        check_outputs(batch.len(), &values)?;
        Ok(values)
    }

    fn kind(&self) -> &str {
        "onnx"
    }
}
