//! REST endpoints for registration wizard sessions.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::manager::{RegistrationManager, SessionView};
use super::model::{Role, options};
use super::otp::CellOutcome;
use super::validation::{FormField, RegistrationForm};
use crate::error::WizardError;
use crate::i18n::{Language, messages};
use crate::store::Preferences;

/// Shared state for registration routes.
#[derive(Clone)]
pub struct RegistrationRouteState {
    pub manager: Arc<RegistrationManager>,
    pub preferences: Preferences,
}

// ── Request bodies ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct CreateSessionBody {
    language: Option<Language>,
    /// Client whose stored language preference seeds the session.
    client: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhoneBody {
    phone: String,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    accepted_terms: bool,
}

#[derive(Debug, Deserialize)]
struct CellBody {
    value: String,
}

#[derive(Debug, Deserialize)]
struct BackspaceBody {
    index: usize,
}

#[derive(Debug, Deserialize)]
struct PasteBody {
    text: String,
}

#[derive(Debug, Deserialize)]
struct FieldBody {
    field: FormField,
    value: String,
}

#[derive(Debug, Deserialize)]
struct LanguageBody {
    language: Language,
}

/// Parse an optional JSON body; an empty body yields `None`.
fn optional_json<T: DeserializeOwned>(body: &Bytes) -> Result<Option<T>, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": format!("Invalid request body: {e}")})),
        )
            .into_response()
    })
}

// ── Error mapping ───────────────────────────────────────────────────

fn status_for(err: &WizardError) -> StatusCode {
    match err {
        WizardError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        WizardError::Busy(_)
        | WizardError::ResendLocked { .. }
        | WizardError::Cancelled
        | WizardError::Stale(_) => StatusCode::CONFLICT,
        WizardError::WrongStep { .. }
        | WizardError::CannotGoBack(_)
        | WizardError::Phone(_)
        | WizardError::IncompleteOtp
        | WizardError::CellOutOfRange(_)
        | WizardError::InvalidForm(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn code_for(err: &WizardError) -> &'static str {
    match err {
        WizardError::WrongStep { .. } => "wrong_step",
        WizardError::CannotGoBack(_) => "cannot_go_back",
        WizardError::Phone(_) => "invalid_phone",
        WizardError::IncompleteOtp => "incomplete_otp",
        WizardError::CellOutOfRange(_) => "cell_out_of_range",
        WizardError::Busy(_) => "busy",
        WizardError::InvalidForm(_) => "invalid_form",
        WizardError::Stale(_) => "stale",
        WizardError::Cancelled => "cancelled",
        WizardError::ResendLocked { .. } => "resend_locked",
        WizardError::SessionNotFound(_) => "session_not_found",
    }
}

/// Localized user-facing message for a rejected action.
fn message_for(err: &WizardError, language: Language) -> String {
    let text = match err {
        WizardError::Phone(rejection) => rejection.message(),
        WizardError::IncompleteOtp => messages::OTP_INCOMPLETE,
        WizardError::InvalidForm(_) => messages::FORM_INVALID,
        WizardError::ResendLocked { remaining_secs } => {
            return messages::RESEND_WAIT
                .get(language)
                .replace("{secs}", &remaining_secs.to_string());
        }
        WizardError::WrongStep { .. } => messages::WRONG_STEP,
        WizardError::Busy(_) => messages::BUSY,
        WizardError::CannotGoBack(_) => messages::CANNOT_GO_BACK,
        WizardError::CellOutOfRange(_) => messages::OTP_CELL_INVALID,
        WizardError::Cancelled => messages::REQUEST_CANCELLED,
        WizardError::Stale(_) => messages::REQUEST_STALE,
        WizardError::SessionNotFound(_) => messages::SESSION_NOT_FOUND,
    };
    text.get(language).to_string()
}

async fn wizard_error(state: &RegistrationRouteState, id: Uuid, err: WizardError) -> Response {
    let status = status_for(&err);
    let view = match err {
        WizardError::SessionNotFound(_) => None,
        _ => state.manager.view(id).await.ok(),
    };
    let language = view
        .as_ref()
        .map(|v| v.wizard.display_language)
        .unwrap_or_default();

    let mut body = serde_json::json!({
        "error": message_for(&err, language),
        "code": code_for(&err),
    });
    if let WizardError::InvalidForm(errors) = &err {
        body["fieldErrors"] = serde_json::json!(errors.localized(language));
    }
    if let WizardError::ResendLocked { remaining_secs } = &err {
        body["remainingSecs"] = serde_json::json!(remaining_secs);
    }
    if let Some(view) = view {
        body["session"] = serde_json::json!(view);
    }

    if status == StatusCode::NOT_FOUND {
        tracing::debug!(session_id = %id, "Unknown registration session");
    } else {
        tracing::debug!(session_id = %id, code = code_for(&err), error = %err, "Wizard action rejected");
    }
    (status, Json(body)).into_response()
}

async fn respond(
    state: &RegistrationRouteState,
    id: Uuid,
    result: Result<SessionView, WizardError>,
) -> Response {
    match result {
        Ok(view) => Json(view).into_response(),
        Err(e) => wizard_error(state, id, e).await,
    }
}

/// Cell / paste responses. A completed code is verified right away.
async fn respond_cell(
    state: &RegistrationRouteState,
    id: Uuid,
    result: Result<(CellOutcome, SessionView), WizardError>,
) -> Response {
    let (outcome, view) = match result {
        Ok(pair) => pair,
        Err(e) => return wizard_error(state, id, e).await,
    };
    if !outcome.auto_submit {
        return Json(serde_json::json!({"cell": outcome, "session": view})).into_response();
    }
    match state.manager.verify_otp(id).await {
        Ok((verification, view)) => Json(serde_json::json!({
            "cell": outcome,
            "verification": verification,
            "session": view,
        }))
        .into_response(),
        Err(e) => wizard_error(state, id, e).await,
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/register
///
/// Body (optional): `{language?, client?}`. Without an explicit language the
/// client's stored preference is used, then Kannada.
async fn create_session(State(state): State<RegistrationRouteState>, body: Bytes) -> Response {
    let body: CreateSessionBody = match optional_json(&body) {
        Ok(body) => body.unwrap_or_default(),
        Err(resp) => return resp,
    };

    let language = match (body.language, body.client.as_deref()) {
        (Some(language), _) => language,
        (None, Some(client)) => match state.preferences.language(client).await {
            Ok(language) => language,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read language preference");
                Language::default()
            }
        },
        (None, None) => Language::default(),
    };

    let view = state.manager.create_session(language).await;
    (StatusCode::CREATED, Json(view)).into_response()
}

/// GET /api/register/{id}
async fn get_session(State(state): State<RegistrationRouteState>, Path(id): Path<Uuid>) -> Response {
    let result = state.manager.view(id).await;
    respond(&state, id, result).await
}

/// DELETE /api/register/{id}
async fn delete_session(State(state): State<RegistrationRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.manager.discard(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => wizard_error(&state, id, e).await,
    }
}

/// POST /api/register/{id}/phone
async fn submit_phone(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PhoneBody>,
) -> Response {
    let result = state
        .manager
        .submit_phone(id, &body.phone, body.role, body.accepted_terms)
        .await;
    respond(&state, id, result).await
}

/// PUT /api/register/{id}/otp/cells/{index}
async fn put_otp_cell(
    State(state): State<RegistrationRouteState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(body): Json<CellBody>,
) -> Response {
    let result = state.manager.enter_otp_digit(id, index, &body.value).await;
    respond_cell(&state, id, result).await
}

/// POST /api/register/{id}/otp/backspace
async fn otp_backspace(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<BackspaceBody>,
) -> Response {
    let result = state.manager.otp_backspace(id, body.index).await;
    respond(&state, id, result).await
}

/// POST /api/register/{id}/otp/paste
async fn otp_paste(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PasteBody>,
) -> Response {
    let result = state.manager.paste_otp(id, &body.text).await;
    respond_cell(&state, id, result).await
}

/// POST /api/register/{id}/otp/verify
///
/// Waits for the simulated verification. A wrong code is still a 200 with
/// `verification: "rejected"` and the hint in the session error.
async fn otp_verify(State(state): State<RegistrationRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.manager.verify_otp(id).await {
        Ok((verification, view)) => {
            Json(serde_json::json!({"verification": verification, "session": view})).into_response()
        }
        Err(e) => wizard_error(&state, id, e).await,
    }
}

/// POST /api/register/{id}/otp/resend
async fn otp_resend(State(state): State<RegistrationRouteState>, Path(id): Path<Uuid>) -> Response {
    let result = state.manager.resend_otp(id).await;
    respond(&state, id, result).await
}

/// GET /api/register/{id}/form
///
/// Current form values plus the option sets for the select fields.
async fn get_form(State(state): State<RegistrationRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.manager.form_defaults(id).await {
        Ok(values) => Json(serde_json::json!({
            "values": values,
            "options": {
                "genders": options::GENDERS,
                "grades": options::GRADES,
                "relationships": options::RELATIONSHIPS,
                "referralSources": options::REFERRAL_SOURCES,
                "states": options::INDIAN_STATES,
                "categories": ["essay", "short_story", "poetry", "creative_non_fiction"],
                "languages": ["en", "kn"],
            },
        }))
        .into_response(),
        Err(e) => wizard_error(&state, id, e).await,
    }
}

/// PATCH /api/register/{id}/form
async fn patch_form(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<FieldBody>,
) -> Response {
    let result = state.manager.update_form_field(id, body.field, &body.value).await;
    respond(&state, id, result).await
}

/// POST /api/register/{id}/form
///
/// Body (optional): a full form replacing the current values.
async fn submit_form(State(state): State<RegistrationRouteState>, Path(id): Path<Uuid>, body: Bytes) -> Response {
    let form: Option<RegistrationForm> = match optional_json(&body) {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    let result = state.manager.submit_form(id, form).await;
    respond(&state, id, result).await
}

/// POST /api/register/{id}/payment
async fn pay(State(state): State<RegistrationRouteState>, Path(id): Path<Uuid>) -> Response {
    let result = state.manager.pay(id).await;
    respond(&state, id, result).await
}

/// POST /api/register/{id}/back
async fn back(State(state): State<RegistrationRouteState>, Path(id): Path<Uuid>) -> Response {
    let result = state.manager.back(id).await;
    respond(&state, id, result).await
}

/// PUT /api/register/{id}/language
async fn set_language(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<LanguageBody>,
) -> Response {
    let result = state.manager.set_language(id, body.language).await;
    respond(&state, id, result).await
}

/// Build the registration REST routes.
pub fn registration_routes(state: RegistrationRouteState) -> Router {
    Router::new()
        .route("/api/register", post(create_session))
        .route("/api/register/{id}", get(get_session).delete(delete_session))
        .route("/api/register/{id}/phone", post(submit_phone))
        .route("/api/register/{id}/otp/cells/{index}", put(put_otp_cell))
        .route("/api/register/{id}/otp/backspace", post(otp_backspace))
        .route("/api/register/{id}/otp/paste", post(otp_paste))
        .route("/api/register/{id}/otp/verify", post(otp_verify))
        .route("/api/register/{id}/otp/resend", post(otp_resend))
        .route(
            "/api/register/{id}/form",
            get(get_form).patch(patch_form).post(submit_form),
        )
        .route("/api/register/{id}/payment", post(pay))
        .route("/api/register/{id}/back", post(back))
        .route("/api/register/{id}/language", put(set_language))
        .with_state(state)
}
