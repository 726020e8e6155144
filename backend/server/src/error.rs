use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{database::StoreError, models::ValidationError};

pub const DUPLICATE_MESSAGE: &str = "This email address is already registered for the workshop.";
pub const FAILURE_MESSAGE: &str =
    "There was an error processing your registration. Please try again.";
pub const LOOKUP_FAILURE_MESSAGE: &str =
    "An error occurred while looking up your access code. Please try again.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("{}", DUPLICATE_MESSAGE)]
    DuplicateEmail,

    #[error("{}", FAILURE_MESSAGE)]
    RegistrationFailed,

    #[error("{}", LOOKUP_FAILURE_MESSAGE)]
    LookupFailed(#[from] StoreError),
}

impl From<JsonRejection> for AppError {
    fn from(_: JsonRejection) -> Self {
        AppError::MalformedPayload
    }
}

impl From<QueryRejection> for AppError {
    fn from(_: QueryRejection) -> Self {
        AppError::MalformedPayload
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, label) = match self {
            AppError::MalformedPayload | AppError::Invalid(_) => (StatusCode::BAD_REQUEST, "invalid"),
            AppError::DuplicateEmail => (StatusCode::CONFLICT, "duplicate"),
            AppError::RegistrationFailed | AppError::LookupFailed(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "error")
            }
        };

        (
            status,
            Json(json!({ "status": label, "message": self.to_string() })),
        )
            .into_response()
    }
}
