//! Error handling
//!
//! Every failure renders the prediction page again with a notice, so the
//! user keeps their inputs and the server keeps running.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use timelytics_core::{InferenceError, MissingFieldError};

use crate::views::{FormValues, Notice, Page};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Field values outside their domain; one message per field
    #[error("invalid input: {}", .messages.join("; "))]
    InvalidInput {
        messages: Vec<String>,
        values: Box<FormValues>,
    },

    #[error("{source}")]
    MissingField {
        #[source]
        source: MissingFieldError,
        values: Box<FormValues>,
    },

    /// The request body is not a urlencoded form
    #[error("malformed form: {0}")]
    BadForm(String),

    #[error("{source}")]
    Inference {
        #[source]
        source: InferenceError,
        values: Box<FormValues>,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } | AppError::MissingField { .. } | AppError::BadForm(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Inference { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let page = match self {
            AppError::InvalidInput { messages, values } => Page {
                notice: Some(Notice::Error(messages)),
                ..Page::with_values(*values)
            },
            AppError::MissingField { source, values } => {
                tracing::debug!("Rejected submission: {}", source);
                Page {
                    notice: Some(Notice::Error(vec![source.to_string()])),
                    ..Page::with_values(*values)
                }
            }
            AppError::BadForm(msg) => {
                tracing::debug!("Undecodable form: {}", msg);
                Page {
                    notice: Some(Notice::Error(vec![msg])),
                    ..Page::default()
                }
            }
            AppError::Inference { source, values } => {
                tracing::error!("Inference error: {}", source);
                Page {
                    notice: Some(Notice::Warning(
                        "The model could not produce an estimate for these inputs. \
                         Please check the values and try again."
                            .to_string(),
                    )),
                    ..Page::with_values(*values)
                }
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                Page {
                    notice: Some(Notice::Warning("Internal server error".to_string())),
                    ..Page::default()
                }
            }
        };

        (status, Html(page.render())).into_response()
    }
}
