//! Features Module - Feature Vector Assembly
//!
//! Turns a submitted order into the fixed-order vector the model expects.
//! The order itself lives in `layout.rs`; nothing else may hard-code indices.

pub mod layout;
pub mod request;
pub mod vector;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::{
    FieldKind, FieldSpec, LayoutInfo, LayoutMismatchError, FEATURE_COUNT, FEATURE_FIELDS,
    FEATURE_LAYOUT, FEATURE_VERSION,
};
pub use request::{FieldError, MissingFieldError, PredictionRequest};
pub use vector::FeatureVector;
