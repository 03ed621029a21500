//! Submitted form → PredictionRequest
//!
//! Inputs are taken as text first so that a rejected submission can be shown
//! back exactly as typed. Numbers are then checked against the field domains
//! before they are narrowed to the request's integer types.

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use timelytics_core::logic::features::{layout::field_spec, FEATURE_COUNT, FEATURE_FIELDS};
use timelytics_core::PredictionRequest;

use crate::error::AppError;
use crate::views::FormValues;

/// Raw form body; absent inputs decode as empty text
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawForm {
    pub purchase_day_of_week: String,
    pub purchase_month: String,
    pub purchase_year: String,
    pub product_size_cm3: String,
    pub product_weight_g: String,
    pub customer_state_code: String,
    pub seller_state_code: String,
    pub distance_km: String,
}

impl RawForm {
    /// Trimmed input text in layout order
    pub fn values(&self) -> FormValues {
        [
            &self.purchase_day_of_week,
            &self.purchase_month,
            &self.purchase_year,
            &self.product_size_cm3,
            &self.product_weight_g,
            &self.customer_state_code,
            &self.seller_state_code,
            &self.distance_km,
        ]
        .map(|text| text.trim().to_string())
    }
}

/// Parsed inputs with their range rules
#[derive(Debug, Default, Validate)]
struct NumericForm {
    #[validate(range(min = 0.0, max = 6.0))]
    purchase_day_of_week: Option<f64>,

    #[validate(range(min = 1.0, max = 12.0))]
    purchase_month: Option<f64>,

    #[validate(range(min = 2000.0, max = 2100.0))]
    purchase_year: Option<f64>,

    #[validate(range(exclusive_min = 0.0))]
    product_size_cm3: Option<f64>,

    #[validate(range(exclusive_min = 0.0))]
    product_weight_g: Option<f64>,

    #[validate(range(min = 0.0))]
    customer_state_code: Option<f64>,

    #[validate(range(min = 0.0))]
    seller_state_code: Option<f64>,

    #[validate(range(min = 0.0))]
    distance_km: Option<f64>,
}

impl From<[Option<f64>; FEATURE_COUNT]> for NumericForm {
    fn from(n: [Option<f64>; FEATURE_COUNT]) -> Self {
        Self {
            purchase_day_of_week: n[0],
            purchase_month: n[1],
            purchase_year: n[2],
            product_size_cm3: n[3],
            product_weight_g: n[4],
            customer_state_code: n[5],
            seller_state_code: n[6],
            distance_km: n[7],
        }
    }
}

/// Check every input and build the request
///
/// Blank inputs pass through as `None`; the predictor reports them. Any
/// text that is not a number in its field's domain rejects the whole form
/// with one message per field, in layout order.
pub fn parse(values: &FormValues) -> Result<PredictionRequest, AppError> {
    let mut numbers = [None; FEATURE_COUNT];
    let mut bad: Vec<&'static str> = Vec::new();

    for (i, text) in values.iter().enumerate() {
        if text.is_empty() {
            continue;
        }
        match text.parse::<f64>() {
            Ok(value) => numbers[i] = Some(value),
            Err(_) => bad.push(FEATURE_FIELDS[i].name),
        }
    }

    if let Err(errors) = NumericForm::from(numbers).validate() {
        for name in invalid_fields(&errors) {
            if !bad.contains(&name) {
                bad.push(name);
            }
        }
    }

    let mut request = PredictionRequest::default();
    for (spec, number) in FEATURE_FIELDS.iter().zip(numbers) {
        let Some(value) = number else { continue };
        if bad.contains(&spec.name) {
            continue;
        }
        // NaN, inf and fractions in integer fields slip past range rules
        if !spec.contains(value) || request.set_by_name(spec.name, value).is_err() {
            bad.push(spec.name);
        }
    }

    if bad.is_empty() {
        return Ok(request);
    }

    let messages = FEATURE_FIELDS
        .iter()
        .filter(|spec| bad.contains(&spec.name))
        .map(|spec| format!("{} must be {}", spec.label, spec.domain()))
        .collect();

    Err(AppError::InvalidInput { messages, values: Box::new(values.clone()) })
}

fn invalid_fields(errors: &ValidationErrors) -> Vec<&'static str> {
    errors
        .field_errors()
        .keys()
        .filter_map(|name| field_spec(name).map(|spec| spec.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(body: &str) -> FormValues {
        serde_urlencoded::from_str::<RawForm>(body).unwrap().values()
    }

    fn rejected(body: &str) -> (Vec<String>, FormValues) {
        match parse(&values(body)) {
            Err(AppError::InvalidInput { messages, values }) => (messages, *values),
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    const FULL: &str = "purchase_day_of_week=0&purchase_month=6&purchase_year=2018\
        &product_size_cm3=37206&product_weight_g=16250&customer_state_code=25\
        &seller_state_code=20&distance_km=247.94";

    #[test]
    fn test_full_form_converts() {
        let request = parse(&values(FULL)).unwrap();
        assert_eq!(request, PredictionRequest::new(0, 6, 2018, 37206.0, 16250.0, 25, 20, 247.94));
    }

    #[test]
    fn test_blank_and_absent_fields_are_none() {
        let values = values("purchase_day_of_week=&purchase_month=%20&distance_km=3");
        assert_eq!(values[0], "");
        assert_eq!(values[1], "");
        assert_eq!(values[2], "");
        assert_eq!(values[7], "3");

        let request = parse(&values).unwrap();
        assert_eq!(request.distance_km, Some(3.0));
        assert_eq!(request.missing_fields().len(), 7);
    }

    #[test]
    fn test_out_of_domain_values_rejected() {
        let body = FULL
            .replace("purchase_month=6", "purchase_month=13")
            .replace("product_weight_g=16250", "product_weight_g=0");
        let (messages, values) = rejected(&body);

        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Purchased Month"));
        assert!(messages[1].starts_with("Product Weight in grams"));
        assert_eq!(values[1], "13");
    }

    #[test]
    fn test_integer_fields_outside_their_type_keep_the_text() {
        let body = FULL
            .replace("customer_state_code=25", "customer_state_code=-1")
            .replace("purchase_day_of_week=0", "purchase_day_of_week=300")
            .replace("purchase_month=6", "purchase_month=2.5");
        let (messages, values) = rejected(&body);

        assert_eq!(
            messages,
            vec![
                "Purchased Day of the Week must be 0–6".to_string(),
                "Purchased Month must be 1–12".to_string(),
                "Geolocation State of the Customer must be ≥ 0".to_string(),
            ]
        );
        assert_eq!(values[0], "300");
        assert_eq!(values[5], "-1");
        assert_eq!(values[7], "247.94");
    }

    #[test]
    fn test_non_finite_rejected() {
        let (messages, _) = rejected(&FULL.replace("distance_km=247.94", "distance_km=NaN"));
        assert_eq!(messages, vec!["Distance (in km) must be ≥ 0".to_string()]);
    }

    #[test]
    fn test_non_numeric_text_rejected_per_field() {
        let (messages, values) = rejected(&FULL.replace("purchase_year=2018", "purchase_year=soon"));
        assert_eq!(messages, vec!["Purchased Year must be 2000–2100".to_string()]);
        assert_eq!(values[2], "soon");
    }
}
