//! Property Tests for Feature Vector Assembly
//!
//! The model only knows positions, so ordering is checked over generated
//! requests rather than a handful of fixed cases.

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use crate::logic::features::{
        FeatureVector, PredictionRequest, FEATURE_COUNT, FEATURE_FIELDS, FEATURE_LAYOUT,
    };

    prop_compose! {
        fn valid_request()(
            dow in 0u8..=6,
            month in 1u8..=12,
            year in 2000u16..=2100,
            size in 0.001f64..500_000.0,
            weight in 0.001f64..50_000.0,
            customer in 0u32..30,
            seller in 0u32..30,
            distance in 0.0f64..5_000.0,
        ) -> PredictionRequest {
            PredictionRequest::new(dow, month, year, size, weight, customer, seller, distance)
        }
    }

    proptest! {
        #[test]
        fn build_is_deterministic(request in valid_request()) {
            let first = FeatureVector::build(&request).unwrap();
            let second = FeatureVector::build(&request).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn build_respects_layout_positions(request in valid_request()) {
            let vector = FeatureVector::build(&request).unwrap();
            for i in 0..FEATURE_COUNT {
                prop_assert_eq!(Some(vector.values[i]), request.value_at(i));
            }
        }

        #[test]
        fn permuted_pairs_give_same_vector(
            request in valid_request(),
            order in Just((0..FEATURE_COUNT).collect::<Vec<_>>()).prop_shuffle(),
        ) {
            let pairs: Vec<(&str, f64)> = order
                .iter()
                .map(|&i| (FEATURE_LAYOUT[i], request.value_at(i).unwrap()))
                .collect();

            let rebuilt = PredictionRequest::from_pairs(pairs).unwrap();
            prop_assert_eq!(
                FeatureVector::build(&rebuilt).unwrap(),
                FeatureVector::build(&request).unwrap()
            );
        }

        #[test]
        fn generated_requests_are_in_domain(request in valid_request()) {
            prop_assert!(request.out_of_range_fields().is_empty());
            for (i, spec) in FEATURE_FIELDS.iter().enumerate() {
                prop_assert!(spec.contains(request.value_at(i).unwrap()));
            }
        }
    }
}
