//! Error types for the HTTP surface.
//!
//! News routes keep the shape clients expect and answer failures with an
//! empty list.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use truthguard_runtime::RuntimeError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("News pipeline failed: {0}")]
    Pipeline(#[from] RuntimeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Pipeline(e) => {
                tracing::error!(error = %e, "News pipeline failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!([]))).into_response()
            }
        }
    }
}
