//! Timelytics Core - OTD prediction engine
//!
//! Loads a pre-trained ensemble regressor once per process, shapes order
//! attributes into the fixed 8-feature layout the model was trained on, and
//! turns the raw regression output into whole delivery days.
//!
//! ## Layout
//! - `logic::features` - feature layout, prediction request, feature vector
//! - `logic::model` - artifact format, regressor backends, process-wide handle
//! - `logic::predictor` - request → vector → model → rounded days
//! - `logic::sample` - static reference rows shown next to the form

pub mod constants;
pub mod logic;

pub use logic::features::{
    FeatureVector, MissingFieldError, PredictionRequest, FEATURE_COUNT, FEATURE_LAYOUT,
};
pub use logic::model::{
    ArtifactLoadError, EngineStatus, InferenceError, ModelHandle, ModelMetadata, Regressor,
};
pub use logic::predictor::{PredictError, PredictionResult, Predictor};
