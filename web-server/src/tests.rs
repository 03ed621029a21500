//! Router tests
//!
//! Requests go through the full router with `oneshot`; the model is a stub
//! or a small artifact written to a temp dir.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use timelytics_core::logic::model::{Estimator, ModelArtifact, Tree};
use timelytics_core::{FeatureVector, InferenceError, ModelHandle, Predictor, Regressor};

use crate::{create_router, AppState, Config};

const SCENARIO_ONE: &str = "purchase_day_of_week=0&purchase_month=6&purchase_year=2018\
    &product_size_cm3=37206.0&product_weight_g=16250.0&customer_state_code=25\
    &seller_state_code=20&distance_km=247.94";

/// Fails above a distance, otherwise answers a constant
struct StubRegressor {
    value: f64,
    max_distance: f64,
    calls: Arc<AtomicUsize>,
}

impl Regressor for StubRegressor {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        batch
            .iter()
            .map(|row| match row.get_by_name("distance_km") {
                Some(d) if d > self.max_distance => Err(InferenceError::Backend("stub failure".to_string())),
                _ => Ok(self.value),
            })
            .collect()
    }

    fn kind(&self) -> &str {
        "stub"
    }
}

fn app_with(handle: ModelHandle) -> Router {
    create_router(AppState {
        predictor: Predictor::new(Arc::new(handle)),
        config: Config::default(),
    })
}

fn stub_app(value: f64) -> (Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let stub = StubRegressor { value, max_distance: 1000.0, calls: Arc::clone(&calls) };
    (app_with(ModelHandle::from_regressor(Box::new(stub), "stub")), calls)
}

fn post_form(body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.into()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_index_renders_form() {
    let (app, calls) = stub_app(5.0);
    let (status, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Timelytics: OTD Prediction"));
    assert!(body.contains("Sample Dataset (For Reference)"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_predict_renders_rounded_days() {
    let (app, _) = stub_app(5.5);
    let (status, body) = send(&app, post_form(SCENARIO_ONE)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Estimated Delivery Time: <strong>6 days</strong>"), "{}", body);
    assert!(body.contains("name=\"distance_km\" value=\"247.94\""));
}

#[tokio::test]
async fn test_missing_field_is_422_without_model_call() {
    let (app, calls) = stub_app(5.0);
    let body = SCENARIO_ONE.replace("distance_km=247.94", "distance_km=");
    let (status, body) = send(&app, post_form(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("missing required field(s): distance_km"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_out_of_range_is_422() {
    let (app, calls) = stub_app(5.0);
    let body = SCENARIO_ONE.replace("purchase_day_of_week=0", "purchase_day_of_week=7");
    let (status, body) = send(&app, post_form(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Purchased Day of the Week must be 0–6"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_negative_state_code_is_422_with_inputs_kept() {
    let (app, calls) = stub_app(5.0);
    let body = SCENARIO_ONE.replace("customer_state_code=25", "customer_state_code=-1");
    let (status, body) = send(&app, post_form(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Geolocation State of the Customer must be ≥ 0"), "{}", body);
    assert!(body.contains("name=\"customer_state_code\" value=\"-1\""));
    assert!(body.contains("name=\"distance_km\" value=\"247.94\""));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_oversized_day_of_week_is_422_with_inputs_kept() {
    let (app, calls) = stub_app(5.0);
    let body = SCENARIO_ONE.replace("purchase_day_of_week=0", "purchase_day_of_week=300");
    let (status, body) = send(&app, post_form(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Purchased Day of the Week must be 0–6"), "{}", body);
    assert!(body.contains("name=\"purchase_day_of_week\" value=\"300\""));
    assert!(body.contains("name=\"seller_state_code\" value=\"20\""));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_numeric_text_is_422_and_escaped() {
    let (app, _) = stub_app(5.0);
    let body = SCENARIO_ONE.replace("purchase_year=2018", "purchase_year=%3Cb%3E");
    let (status, body) = send(&app, post_form(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Purchased Year must be 2000–2100"));
    assert!(body.contains("name=\"purchase_year\" value=\"&lt;b&gt;\""));
    assert!(!body.contains("<b>"));
}

#[tokio::test]
async fn test_non_form_body_is_422() {
    let (app, _) = stub_app(5.0);
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("name=\"distance_km\" value=\"475.35\""));
}

#[tokio::test]
async fn test_inference_failure_keeps_serving() {
    let (app, _) = stub_app(3.2);

    let far = SCENARIO_ONE.replace("distance_km=247.94", "distance_km=5000");
    let (status, body) = send(&app, post_form(far)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("could not produce an estimate"));

    let (status, body) = send(&app, post_form(SCENARIO_ONE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<strong>3 days</strong>"));
}

#[tokio::test]
async fn test_health_reports_model_status() {
    let (app, _) = stub_app(4.0);
    send(&app, post_form(SCENARIO_ONE)).await;

    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["environment"], "development");
    assert_eq!(json["model"]["model_kind"], "stub");
    assert_eq!(json["model"]["inference_count"], 1);
}

#[tokio::test]
async fn test_served_from_artifact_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voting_model.json.gz");
    let model = Estimator::Voting {
        weights: None,
        estimators: vec![
            Estimator::RandomForest { trees: vec![Tree::leaf(6.0), Tree::leaf(8.0)] },
            Estimator::GradientBoosting {
                base_score: 4.0,
                trees: vec![Tree::stump(7, 100.0, 0.0, 4.0)],
            },
        ],
    };
    ModelArtifact::new("voting_model", model).save(&path).unwrap();

    // (7 + 8) / 2 → 7.5 → 8
    let app = app_with(ModelHandle::load(&path, None).unwrap());
    let (status, body) = send(&app, post_form(SCENARIO_ONE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<strong>8 days</strong>"), "{}", body);
}
