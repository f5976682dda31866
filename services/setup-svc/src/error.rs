use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("flow {0} does not exist")]
    FlowNotFound(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetails<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetails<'a> {
    code: &'a str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::FlowNotFound(_) => (StatusCode::NOT_FOUND, "flow_not_found"),
        };

        let mut response = Json(ErrorBody {
            error: ErrorDetails {
                code,
                message: self.to_string(),
            },
        })
        .into_response();
        *response.status_mut() = status;
        response
    }
}
