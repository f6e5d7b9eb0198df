use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::service_desk_client::DataSourceError;
use crate::stats::MalformedFieldError;

/// Failure of a request pipeline. Every variant becomes a 500 with a generic
/// body; the detail only goes to the log.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to fetch data: {0}")]
    FetchData(DataSourceError),
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error(transparent)]
    MalformedField(#[from] MalformedFieldError),
}

impl AppError {
    fn public_message(&self) -> &'static str {
        match self {
            AppError::FetchData(_) => "Failed to fetch data",
            AppError::DataSource(_) | AppError::MalformedField(_) => "Internal Server Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.public_message() })),
        )
            .into_response()
    }
}
