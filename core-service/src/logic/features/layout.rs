//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! The delivery-time model was trained on a positional encoding and knows
//! nothing about field names. The order below is the contract between the
//! artifact and this crate.
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Every artifact records the version and hash it was trained against, and
//! loading refuses an artifact whose layout differs.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector
/// This is the SINGLE SOURCE OF TRUTH for feature layout
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Purchase date (0-2) ===
    "purchase_day_of_week",  // 0: 0 = Monday .. 6 = Sunday
    "purchase_month",        // 1: 1-12
    "purchase_year",         // 2: 2000-2100

    // === Product (3-4) ===
    "product_size_cm3",      // 3: Package volume in cm³
    "product_weight_g",      // 4: Package weight in grams

    // === Geography (5-7) ===
    "customer_state_code",   // 5: Encoded customer state
    "seller_state_code",     // 6: Encoded seller state
    "distance_km",           // 7: Seller → customer distance
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 8;

// ============================================================================
// FIELD DOMAINS
// ============================================================================

/// Whether a field takes whole numbers or real numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Number,
}

/// Domain of one input field, shared by the form and the reference table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub min: f64,
    /// `true` when `min` itself is not allowed (sizes and weights must be > 0)
    pub min_exclusive: bool,
    pub max: Option<f64>,
}

impl FieldSpec {
    /// Check a value against this field's domain
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        if self.kind == FieldKind::Integer && value.fract() != 0.0 {
            return false;
        }
        let above_min = if self.min_exclusive { value > self.min } else { value >= self.min };
        let below_max = self.max.map_or(true, |max| value <= max);
        above_min && below_max
    }

    /// Human-readable domain, e.g. `0–6` or `> 0`
    pub fn domain(&self) -> String {
        match (self.min_exclusive, self.max) {
            (false, Some(max)) => format!("{}–{}", self.min, max),
            (true, Some(max)) => format!("> {} and ≤ {}", self.min, max),
            (false, None) => format!("≥ {}", self.min),
            (true, None) => format!("> {}", self.min),
        }
    }
}

/// Field domains in layout order
pub const FEATURE_FIELDS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec {
        name: "purchase_day_of_week",
        label: "Purchased Day of the Week",
        kind: FieldKind::Integer,
        min: 0.0,
        min_exclusive: false,
        max: Some(6.0),
    },
    FieldSpec {
        name: "purchase_month",
        label: "Purchased Month",
        kind: FieldKind::Integer,
        min: 1.0,
        min_exclusive: false,
        max: Some(12.0),
    },
    FieldSpec {
        name: "purchase_year",
        label: "Purchased Year",
        kind: FieldKind::Integer,
        min: 2000.0,
        min_exclusive: false,
        max: Some(2100.0),
    },
    FieldSpec {
        name: "product_size_cm3",
        label: "Product Size in cm³",
        kind: FieldKind::Number,
        min: 0.0,
        min_exclusive: true,
        max: None,
    },
    FieldSpec {
        name: "product_weight_g",
        label: "Product Weight in grams",
        kind: FieldKind::Number,
        min: 0.0,
        min_exclusive: true,
        max: None,
    },
    FieldSpec {
        name: "customer_state_code",
        label: "Geolocation State of the Customer",
        kind: FieldKind::Integer,
        min: 0.0,
        min_exclusive: false,
        max: None,
    },
    FieldSpec {
        name: "seller_state_code",
        label: "Geolocation State of the Seller",
        kind: FieldKind::Integer,
        min: 0.0,
        min_exclusive: false,
        max: None,
    },
    FieldSpec {
        name: "distance_km",
        label: "Distance (in km)",
        kind: FieldKind::Number,
        min: 0.0,
        min_exclusive: false,
        max: None,
    },
];

/// Look up a field's domain by name
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FEATURE_FIELDS.iter().find(|spec| spec.name == name)
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
/// Used to detect layout mismatches at artifact load time
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Get layout hash
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information, embedded in artifacts and logged at load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Validate that this layout is the one compiled into the crate
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.hash)
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when feature layout doesn't match expected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), \
     got v{actual_version} (hash: {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

// ============================================================================
// TESTS
// ============================================================================
