//! REST API route definitions.

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::web::handlers::sessions;
use crate::web::state::WebAppState;

/// Build the API router with all REST endpoints.
pub fn api_routes() -> Router<WebAppState> {
    Router::new()
        // Session routes
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/{id}/inputs", patch(sessions::update_inputs))
        .route("/sessions/{id}/bookmark", post(sessions::bookmark_session))
}
