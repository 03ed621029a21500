//! Model Module - Inference Engine
//!
//! Keeps inference apart from feature assembly: the artifact format, the
//! backends that satisfy `Regressor`, and the process-wide handle.

pub mod artifact;
pub mod ensemble;
pub mod handle;
pub mod inference;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod tree;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export common types
pub use artifact::{ArtifactKind, ArtifactLoadError, ModelArtifact};
pub use ensemble::{Estimator, Kernel, ModelValidationError, NativeEnsemble, StandardScaler};
pub use handle::{EngineStatus, ModelHandle, ModelMetadata};
pub use inference::{InferenceError, Regressor};
pub use tree::{Node, SplitRule, Tree};
