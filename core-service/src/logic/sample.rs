//! Reference rows shown beside the input form
//!
//! Static data, never fed to the model.

use super::features::{PredictionRequest, FEATURE_COUNT, FEATURE_FIELDS};

/// Column headers, in layout order
pub fn headers() -> [&'static str; FEATURE_COUNT] {
    FEATURE_FIELDS.map(|spec| spec.label)
}

/// The three reference orders
pub fn reference_rows() -> Vec<PredictionRequest> {
    vec![
        PredictionRequest::new(0, 6, 2018, 37206.0, 16250.0, 25, 20, 247.94),
        PredictionRequest::new(3, 3, 2017, 63714.0, 7249.0, 25, 7, 250.35),
        PredictionRequest::new(1, 1, 2018, 54816.0, 9600.0, 25, 20, 4.915),
    ]
}

/// Form defaults for a fresh page
pub fn form_defaults() -> PredictionRequest {
    PredictionRequest::new(3, 1, 2018, 9328.0, 1800.0, 10, 20, 475.35)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_rows_are_complete_and_in_domain() {
        let rows = reference_rows();
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert!(row.is_complete());
            assert!(row.out_of_range_fields().is_empty(), "{:?}", row);
        }
        assert_eq!(rows[2].distance_km, Some(4.915));
    }

    #[test]
    fn test_headers_follow_layout() {
        let headers = headers();
        assert_eq!(headers[0], "Purchased Day of the Week");
        assert_eq!(headers[7], "Distance (in km)");
    }

    #[test]
    fn test_form_defaults_in_domain() {
        let defaults = form_defaults();
        assert!(defaults.is_complete());
        assert!(defaults.out_of_range_fields().is_empty());
    }
}
