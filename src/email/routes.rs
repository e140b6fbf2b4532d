//! POST /api/send-email: confirmation email endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use super::dispatcher::{DispatchOutcome, EmailDispatcher};
use crate::i18n::Language;
use crate::registration::model::RegistrationRecord;

/// Shared state for the email route.
#[derive(Clone)]
pub struct EmailRouteState {
    pub dispatcher: Arc<EmailDispatcher>,
}

fn missing_fields() -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": "Missing required fields"})),
    )
        .into_response()
}

/// Pull `registrationData` and `language` out of the body. Absent, null or
/// unparseable values count as missing.
fn parse_request(body: &Value) -> Option<(RegistrationRecord, Language)> {
    let data = body.get("registrationData").filter(|v| !v.is_null())?;
    let language = body
        .get("language")
        .and_then(Value::as_str)
        .and_then(Language::parse)?;
    let record: RegistrationRecord = serde_json::from_value(data.clone()).ok()?;
    Some((record, language))
}

/// POST /api/send-email
///
/// Body: `{registrationData, language}`. Returns 400 when either is missing,
/// 500 when delivery fails.
async fn send_email(
    State(state): State<EmailRouteState>,
    body: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(body)) = body else {
        return missing_fields();
    };
    let Some((record, language)) = parse_request(&body) else {
        return missing_fields();
    };

    match state.dispatcher.send_confirmation(&record, language).await {
        Ok(DispatchOutcome::Development(details)) => Json(serde_json::json!({
            "success": true,
            "message": "Email sent successfully (development mode)",
            "developmentMode": true,
            "emailDetails": details,
        }))
        .into_response(),
        Ok(DispatchOutcome::Sent {
            student_email_id,
            parent_email_id,
        }) => Json(serde_json::json!({
            "success": true,
            "message": "Emails sent successfully",
            "studentEmailId": student_email_id,
            "parentEmailId": parent_email_id,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Error sending email");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Failed to send email",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// Build the email route.
pub fn email_routes(state: EmailRouteState) -> Router {
    Router::new()
        .route("/api/send-email", post(send_email))
        .with_state(state)
}
