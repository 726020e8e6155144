use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use crate::{
    access_code::AccessCode,
    error::AppError,
    lookup::LookupOutcome,
    models::{Registrant, Registration, RegistrationForm},
    notify::{NotifyError, registration_email},
    registration::RegistrationOutcome,
    state::AppState,
};

pub const REGISTERED_MESSAGE: &str =
    "Registration successful! Your access code will be sent to your email before the event date.";
pub const FOUND_MESSAGE: &str = "Please save this code. You'll need it to enter the workshop.";
pub const NOT_FOUND_MESSAGE: &str = "We couldn't find a registration for this email address.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCodeResponse {
    pub status: &'static str,
    pub access_code: AccessCode,
    pub message: &'static str,
}

#[derive(Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    #[serde(flatten)]
    form: RegistrationForm,
    #[serde(default)]
    access_code: String,
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegistrationForm>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(form) = payload?;

    match state.registrations.register(form).await {
        RegistrationOutcome::Success { access_code } => Ok((
            StatusCode::CREATED,
            Json(AccessCodeResponse {
                status: "success",
                access_code,
                message: REGISTERED_MESSAGE,
            }),
        )),
        RegistrationOutcome::DuplicateEmail => Err(AppError::DuplicateEmail),
        RegistrationOutcome::Invalid(e) => Err(AppError::Invalid(e)),
        RegistrationOutcome::Failure { .. } => Err(AppError::RegistrationFailed),
    }
}

pub async fn lookup_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;

    match state.lookup.lookup(&query.email).await? {
        LookupOutcome::Found { access_code } => Ok((
            StatusCode::OK,
            Json(AccessCodeResponse {
                status: "found",
                access_code,
                message: FOUND_MESSAGE,
            }),
        )
            .into_response()),
        LookupOutcome::NotFound => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "not_found", "message": NOT_FOUND_MESSAGE })),
        )
            .into_response()),
    }
}

/// Sends the organizer email for an already issued code, straight from the browser.
pub async fn notification_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return notification_error(StatusCode::BAD_REQUEST, "Malformed payload", None);
    };

    let access_code = request.access_code.trim().to_string();
    if access_code.is_empty() {
        return notification_error(
            StatusCode::BAD_REQUEST,
            "Invalid registration payload",
            Some("accessCode is required".into()),
        );
    }

    let registrant = match Registrant::try_from(request.form) {
        Ok(registrant) => registrant,
        Err(e) => {
            return notification_error(
                StatusCode::BAD_REQUEST,
                "Invalid registration payload",
                Some(e.to_string()),
            );
        }
    };

    let registration = Registration {
        registrant,
        access_code: AccessCode::from(access_code),
        created_at: Utc::now(),
    };
    let message = registration_email(&registration, &state.config.mail);

    match state.notifier.send(&message).await {
        Ok(id) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Registration email sent successfully",
                "emailId": id,
            })),
        )
            .into_response(),
        Err(NotifyError::NotConfigured) => {
            error!("RESEND_API_KEY is not set");
            notification_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Email service not configured",
                None,
            )
        }
        Err(e) => {
            warn!("Failed to send registration email for {}: {e}", registration.email());
            notification_error(
                StatusCode::BAD_GATEWAY,
                "Failed to send registration email",
                Some(e.to_string()),
            )
        }
    }
}

/// Preflight without CORS request headers still gets an empty 200.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

fn notification_error(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = match details {
        Some(details) => json!({ "error": error, "details": details }),
        None => json!({ "error": error }),
    };

    (status, Json(body)).into_response()
}
