//! Prediction Request - one order submitted for an OTD estimate
//!
//! Every field is optional so that an incomplete submission can be
//! represented and rejected with [`MissingFieldError`] instead of being
//! silently zero-filled.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::layout::{feature_index, FEATURE_COUNT, FEATURE_FIELDS, FEATURE_LAYOUT};

// ============================================================================
// ERRORS
// ============================================================================

/// One or more required fields were absent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required field(s): {}", .fields.join(", "))]
pub struct MissingFieldError {
    /// Missing field names, in layout order
    pub fields: Vec<&'static str>,
}

/// Errors from name→value input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("unknown field: {0}")]
    Unknown(String),

    #[error("field {field} expects a whole number in range, got {value}")]
    NotRepresentable { field: &'static str, value: f64 },
}

// ============================================================================
// REQUEST
// ============================================================================

/// Eight order attributes, named as in the feature layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub purchase_day_of_week: Option<u8>,
    pub purchase_month: Option<u8>,
    pub purchase_year: Option<u16>,
    pub product_size_cm3: Option<f64>,
    pub product_weight_g: Option<f64>,
    pub customer_state_code: Option<u32>,
    pub seller_state_code: Option<u32>,
    pub distance_km: Option<f64>,
}

impl PredictionRequest {
    /// Build a complete request
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        purchase_day_of_week: u8,
        purchase_month: u8,
        purchase_year: u16,
        product_size_cm3: f64,
        product_weight_g: f64,
        customer_state_code: u32,
        seller_state_code: u32,
        distance_km: f64,
    ) -> Self {
        Self {
            purchase_day_of_week: Some(purchase_day_of_week),
            purchase_month: Some(purchase_month),
            purchase_year: Some(purchase_year),
            product_size_cm3: Some(product_size_cm3),
            product_weight_g: Some(product_weight_g),
            customer_state_code: Some(customer_state_code),
            seller_state_code: Some(seller_state_code),
            distance_km: Some(distance_km),
        }
    }

    /// Build from name/value pairs in any order
    ///
    /// Later pairs overwrite earlier ones with the same name. Absent names stay
    /// `None` and surface later as [`MissingFieldError`].
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut request = Self::default();
        for (name, value) in pairs {
            request.set_by_name(name, value)?;
        }
        Ok(request)
    }

    /// Set one field by layout name
    pub fn set_by_name(&mut self, name: &str, value: f64) -> Result<(), FieldError> {
        let index = feature_index(name).ok_or_else(|| FieldError::Unknown(name.to_string()))?;
        let field = FEATURE_LAYOUT[index];

        match index {
            0 => self.purchase_day_of_week = Some(whole(field, value)?),
            1 => self.purchase_month = Some(whole(field, value)?),
            2 => self.purchase_year = Some(whole(field, value)?),
            3 => self.product_size_cm3 = Some(value),
            4 => self.product_weight_g = Some(value),
            5 => self.customer_state_code = Some(whole(field, value)?),
            6 => self.seller_state_code = Some(whole(field, value)?),
            7 => self.distance_km = Some(value),
            _ => return Err(FieldError::Unknown(name.to_string())),
        }

        Ok(())
    }

    /// Value of the field at a layout position, widened to f64
    pub fn value_at(&self, index: usize) -> Option<f64> {
        match index {
            0 => self.purchase_day_of_week.map(f64::from),
            1 => self.purchase_month.map(f64::from),
            2 => self.purchase_year.map(f64::from),
            3 => self.product_size_cm3,
            4 => self.product_weight_g,
            5 => self.customer_state_code.map(f64::from),
            6 => self.seller_state_code.map(f64::from),
            7 => self.distance_km,
            _ => None,
        }
    }

    /// Names of absent fields, in layout order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        (0..FEATURE_COUNT)
            .filter(|&i| self.value_at(i).is_none())
            .map(|i| FEATURE_LAYOUT[i])
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        (0..FEATURE_COUNT).all(|i| self.value_at(i).is_some())
    }

    /// Names of present fields whose value falls outside the documented domain
    pub fn out_of_range_fields(&self) -> Vec<&'static str> {
        FEATURE_FIELDS
            .iter()
            .enumerate()
            .filter_map(|(i, spec)| match self.value_at(i) {
                Some(value) if !spec.contains(value) => Some(spec.name),
                _ => None,
            })
            .collect()
    }
}

/// Convert to an unsigned integer field, rejecting fractions and overflow
fn whole<T: TryFrom<u64>>(field: &'static str, value: f64) -> Result<T, FieldError> {
    let err = || FieldError::NotRepresentable { field, value };
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > u64::MAX as f64 {
        return Err(err());
    }
    T::try_from(value as u64).map_err(|_| err())
}
