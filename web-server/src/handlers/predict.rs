//! Prediction page handlers

use axum::{
    extract::{rejection::FormRejection, State},
    response::Html,
    Form,
};

use crate::error::{AppError, AppResult};
use crate::handlers::form::{self, RawForm};
use crate::views::Page;
use crate::AppState;
use timelytics_core::PredictError;

/// Empty form with the default inputs
pub async fn index() -> Html<String> {
    Html(Page::default().render())
}

/// Run one prediction and render the result below the form
pub async fn submit(
    State(state): State<AppState>,
    body: Result<Form<RawForm>, FormRejection>,
) -> AppResult<Html<String>> {
    let Form(raw) = body.map_err(|rejection| AppError::BadForm(rejection.body_text()))?;
    let values = raw.values();
    let request = form::parse(&values)?;

    let predictor = state.predictor.clone();
    // Inference runs on the blocking pool
    let outcome = tokio::task::spawn_blocking(move || predictor.predict(&request))
        .await
        .map_err(|e| AppError::Internal(format!("prediction task failed: {}", e)))?;

    match outcome {
        Ok(result) => {
            tracing::info!(days = result.days, raw = result.raw, "Prediction served");
            Ok(Html(
                Page {
                    result: Some(result),
                    ..Page::with_values(values)
                }
                .render(),
            ))
        }
        Err(PredictError::MissingField(source)) => Err(AppError::MissingField {
            source,
            values: Box::new(values),
        }),
        Err(PredictError::Inference(source)) => Err(AppError::Inference {
            source,
            values: Box::new(values),
        }),
    }
}
