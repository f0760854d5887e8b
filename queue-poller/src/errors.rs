use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("no polled queue is named {0}")]
    QueueNotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, err_msg): (StatusCode, &'static str) = match self {
            Self::QueueNotFound(_) => (StatusCode::NOT_FOUND, "Queue not found"),
        };

        tracing::warn!("Error in admin API: {}", self);

        let body = Json(json!({
            "error": err_msg,
        }));

        (status, body).into_response()
    }
}
