//! Logic Module - Prediction pipeline
//!
//! - `features/` - feature layout and vector assembly
//! - `model/` - artifact loading and inference backends
//! - `predictor` - the request pipeline used by the presentation layer

pub mod features;
pub mod model;
pub mod predictor;
pub mod sample;
