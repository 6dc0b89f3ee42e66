//! HTTP error mapping.

use crate::analysis::AnalysisError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sketchlens_core::{DocumentError, PromptError, RasterError};
use sketchlens_render::RendererError;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),
    #[error("No analysis has been run in this session yet")]
    NoReport,
    #[error("No reference image has been uploaded to this session")]
    NoReference,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Nothing to analyze: draw on the canvas first")]
    EmptyCanvas,
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Canvas(#[from] sketchlens_core::ConfigError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("Background task failed: {0}")]
    Worker(String),
    #[error("Too many open sessions (limit {0}); close one and retry")]
    SessionLimit(usize),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) | ApiError::NoReport | ApiError::NoReference => {
                StatusCode::NOT_FOUND
            }
            ApiError::BadRequest(_) | ApiError::Prompt(_) | ApiError::Canvas(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Render(RendererError::Decode(_)) => StatusCode::BAD_REQUEST,
            ApiError::EmptyCanvas => StatusCode::CONFLICT,
            ApiError::Analysis(AnalysisError::Remote(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Analysis(AnalysisError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Document(_)
            | ApiError::Raster(_)
            | ApiError::Render(_)
            | ApiError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{status}: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
