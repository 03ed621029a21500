//! Model Handle - the loaded regressor, loaded once per process
//!
//! `init` loads the artifact through a write-once cell; every later caller
//! gets the same `Arc<ModelHandle>` through `global`. The handle is read-only
//! after load apart from its statistics counters.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use super::artifact::{self, ArtifactKind, ArtifactLoadError, ModelArtifact};
use super::ensemble::NativeEnsemble;
use super::inference::{check_outputs, InferenceError, Regressor};
use crate::logic::features::{FeatureVector, LayoutInfo};

// ============================================================================
// STATE
// ============================================================================

/// Process-wide model (write-once)
static MODEL: OnceCell<Arc<ModelHandle>> = OnceCell::new();

/// Load the process model, or return the one already loaded
///
/// A failed load leaves the cell empty and returns the error; the caller
/// decides whether that is fatal (the form server treats it as fatal).
pub fn init(path: impl AsRef<Path>, expected_sha256: Option<&str>) -> Result<Arc<ModelHandle>, ArtifactLoadError> {
    let path = path.as_ref();
    if let Some(existing) = MODEL.get() {
        if existing.metadata.path != path.display().to_string() {
            log::warn!(
                "Model already loaded from {}; ignoring {}",
                existing.metadata.path,
                path.display()
            );
        }
        return Ok(Arc::clone(existing));
    }

    MODEL
        .get_or_try_init(|| ModelHandle::load(path, expected_sha256).map(Arc::new))
        .map(Arc::clone)
}

/// Read accessor for the process model
pub fn global() -> Option<Arc<ModelHandle>> {
    MODEL.get().cloned()
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    pub path: String,
    pub kind: String,
    pub format_version: Option<u32>,
    pub layout: LayoutInfo,
    pub trained_at: Option<DateTime<Utc>>,
    pub loaded_at: DateTime<Utc>,
    pub sha256: Option<String>,
}

/// Engine status for the health probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_name: String,
    pub model_kind: String,
    pub loaded_at: DateTime<Utc>,
    pub inference_count: u64,
    pub failure_count: u64,
    pub avg_latency_ms: f64,
}

// ============================================================================
// HANDLE
// ============================================================================

pub struct ModelHandle {
    regressor: Box<dyn Regressor>,
    metadata: ModelMetadata,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
    failure_count: AtomicU64,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("metadata", &self.metadata)
            .field("inference_count", &self.inference_count.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ModelHandle {
    /// Load an artifact from disk
    ///
    /// The checksum is verified against `expected_sha256` when given, else
    /// against `<path>.sha256` when that file exists.
    pub fn load(path: impl AsRef<Path>, expected_sha256: Option<&str>) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        log::info!("Loading model artifact from: {}", path.display());

        let bytes = artifact::read_artifact(path)?;
        let digest = artifact::sha256_hex(&bytes);

        let expected = match expected_sha256 {
            Some(expected) => Some(expected.to_string()),
            None => artifact::read_sidecar(path)?,
        };
        match expected {
            Some(expected) => {
                artifact::verify_checksum(&digest, &expected)?;
                log::info!("Model checksum verified (sha256 {})", digest);
            }
            None => log::debug!("No checksum configured for model (sha256 {})", digest),
        }

        let handle = match ArtifactKind::detect(path) {
            ArtifactKind::Native => {
                let artifact = ModelArtifact::from_bytes(&bytes)?;
                let ensemble = NativeEnsemble::new(artifact.model)?;
                let metadata = ModelMetadata {
                    name: artifact.name,
                    path: path.display().to_string(),
                    kind: ensemble.kind().to_string(),
                    format_version: Some(artifact.format_version),
                    layout: artifact.layout,
                    trained_at: artifact.trained_at,
                    loaded_at: Utc::now(),
                    sha256: Some(digest),
                };
                log::info!(
                    "Loaded {} model '{}' ({} base estimator(s))",
                    metadata.kind,
                    metadata.name,
                    ensemble.root().leaf_estimator_count()
                );
                Self::with_metadata(Box::new(ensemble), metadata)
            }
            ArtifactKind::Onnx => Self::load_onnx(path, &bytes, digest)?,
        };

        Ok(handle)
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(path: &Path, bytes: &[u8], digest: String) -> Result<Self, ArtifactLoadError> {
        let regressor = super::onnx::OnnxRegressor::from_bytes(bytes)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());
        let metadata = ModelMetadata {
            name,
            path: path.display().to_string(),
            kind: regressor.kind().to_string(),
            format_version: None,
            // ONNX graphs carry no layout; the exporter must follow FEATURE_LAYOUT
            layout: LayoutInfo::current(),
            trained_at: None,
            loaded_at: Utc::now(),
            sha256: Some(digest),
        };
        Ok(Self::with_metadata(Box::new(regressor), metadata))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(path: &Path, _bytes: &[u8], _digest: String) -> Result<Self, ArtifactLoadError> {
        Err(ArtifactLoadError::Unsupported(format!(
            "{} is an ONNX model but this build has no `onnx` feature",
            path.display()
        )))
    }

    /// Wrap any regressor (embedded models, test doubles)
    pub fn from_regressor(regressor: Box<dyn Regressor>, name: impl Into<String>) -> Self {
        let metadata = ModelMetadata {
            name: name.into(),
            path: "<memory>".to_string(),
            kind: regressor.kind().to_string(),
            format_version: None,
            layout: LayoutInfo::current(),
            trained_at: None,
            loaded_at: Utc::now(),
            sha256: None,
        };
        Self::with_metadata(regressor, metadata)
    }

    fn with_metadata(regressor: Box<dyn Regressor>, metadata: ModelMetadata) -> Self {
        Self {
            regressor,
            metadata,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Run the regressor and record latency / failures
    pub fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        let start = Instant::now();

        let result = self
            .regressor
            .predict(batch)
            .and_then(|outputs| check_outputs(batch.len(), &outputs).map(|_| outputs));

        match &result {
            Ok(_) => {
                self.latency_sum_us
                    .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
                self.inference_count.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
                log::warn!("Inference failed on model '{}': {}", self.metadata.name, e);
            }
        }

        result
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f64 / count as f64) / 1000.0 } else { 0.0 };

        EngineStatus {
            model_name: self.metadata.name.clone(),
            model_kind: self.metadata.kind.clone(),
            loaded_at: self.metadata.loaded_at,
            inference_count: count,
            failure_count: self.failure_count.load(Ordering::Relaxed),
            avg_latency_ms: avg,
        }
    }
}
