//! REST endpoints for per-client preferences.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::preferences::Preferences;
use crate::error::StoreError;
use crate::i18n::Language;

/// Shared state for preference routes.
#[derive(Clone)]
pub struct PreferenceRouteState {
    pub preferences: Preferences,
}

#[derive(Debug, Deserialize)]
struct LanguageBody {
    language: String,
}

#[derive(Debug, Deserialize)]
struct SignInBody {
    email: String,
}

fn store_error(e: StoreError) -> Response {
    tracing::error!(error = %e, "Preference store failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": e.to_string()})),
    )
        .into_response()
}

/// GET /api/preferences/{client}/language
async fn get_language(State(state): State<PreferenceRouteState>, Path(client): Path<String>) -> Response {
    match state.preferences.language(&client).await {
        Ok(language) => Json(serde_json::json!({"language": language})).into_response(),
        Err(e) => store_error(e),
    }
}

/// PUT /api/preferences/{client}/language
async fn put_language(
    State(state): State<PreferenceRouteState>,
    Path(client): Path<String>,
    Json(body): Json<LanguageBody>,
) -> Response {
    let Some(language) = Language::parse(&body.language) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": format!("Unsupported language: {}", body.language)})),
        )
            .into_response();
    };
    match state.preferences.set_language(&client, language).await {
        Ok(()) => Json(serde_json::json!({"language": language})).into_response(),
        Err(e) => store_error(e),
    }
}

/// GET /api/preferences/{client}/admin
async fn get_admin(State(state): State<PreferenceRouteState>, Path(client): Path<String>) -> Response {
    match state.preferences.admin_session(&client).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => store_error(e),
    }
}

/// POST /api/preferences/{client}/admin
async fn sign_in(
    State(state): State<PreferenceRouteState>,
    Path(client): Path<String>,
    Json(body): Json<SignInBody>,
) -> Response {
    match state.preferences.admin_sign_in(&client, &body.email).await {
        Ok(true) => match state.preferences.admin_session(&client).await {
            Ok(session) => Json(session).into_response(),
            Err(e) => store_error(e),
        },
        Ok(false) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid email address"})),
        )
            .into_response(),
        Err(e) => store_error(e),
    }
}

/// DELETE /api/preferences/{client}/admin
async fn sign_out(State(state): State<PreferenceRouteState>, Path(client): Path<String>) -> Response {
    match state.preferences.admin_sign_out(&client).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error(e),
    }
}

/// Build the preference REST routes.
pub fn preference_routes(state: PreferenceRouteState) -> Router {
    Router::new()
        .route(
            "/api/preferences/{client}/language",
            get(get_language).put(put_language),
        )
        .route(
            "/api/preferences/{client}/admin",
            get(get_admin).post(sign_in).delete(sign_out),
        )
        .with_state(state)
}
