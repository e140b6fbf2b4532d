//! HTTP application assembly.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::email::{EmailDispatcher, EmailRouteState, email_routes};
use crate::registration::{RegistrationManager, RegistrationRouteState, registration_routes};
use crate::store::{PreferenceRouteState, Preferences, preference_routes};

/// Everything the routers need.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<RegistrationManager>,
    pub dispatcher: Arc<EmailDispatcher>,
    pub preferences: Preferences,
}

async fn health(State(manager): State<Arc<RegistrationManager>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "janapada",
        "sessions": manager.session_count().await
    }))
}

/// Build the full router: registration, email, preferences and `/health`.
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health))
        .with_state(Arc::clone(&state.manager));

    Router::new()
        .merge(health_routes)
        .merge(registration_routes(RegistrationRouteState {
            manager: state.manager,
            preferences: state.preferences.clone(),
        }))
        .merge(email_routes(EmailRouteState {
            dispatcher: state.dispatcher,
        }))
        .merge(preference_routes(PreferenceRouteState {
            preferences: state.preferences,
        }))
        .layer(CorsLayer::permissive())
}
