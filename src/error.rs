use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of a single day-plan generation or its persistence.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("A IA retornou uma resposta vazia.")]
    EmptyResponse,

    #[error("malformed JSON from model: {0}")]
    MalformedJson(String),

    #[error("invalid plan shape: {0}")]
    InvalidPlanShape(String),

    #[error("upstream error: {0}")]
    UpstreamError(String),

    #[error("persistence error: {0}")]
    PersistenceError(String),
}

/// HTTP-facing error, rendered as `{ "message": ... }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(e: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
    }
}

impl From<PlanError> for ApiError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::PersistenceError(msg) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg),
            other => Self::bad_request(format!("Falha na IA: {other}")),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}
