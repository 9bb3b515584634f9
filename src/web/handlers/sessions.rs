//! Session handlers for the snapmark web API.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::bookmark::{BookmarkMode, InputValue};
use crate::replay::{InputRegistry, TriggerPolicy};
use crate::web::error::WebError;
use crate::web::state::{Session, WebAppState};

/// Response for a single session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub policy: TriggerPolicy,
    pub store: BookmarkMode,
    /// Current input values; binary content uses its tagged form
    pub inputs: BTreeMap<String, Value>,
    /// Query currently reflected in the address bar
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SessionResponse {
    fn new(id: Uuid, session: &Session, warnings: Vec<String>) -> Self {
        let inputs = session
            .registry()
            .snapshot()
            .into_iter()
            .map(|(k, v)| (k, v.to_api_json()))
            .collect();

        Self {
            id,
            policy: session.policy(),
            store: session.serializer().mode(),
            inputs,
            location: session.location().map(str::to_string),
            warnings,
        }
    }
}

/// Request to create a new session.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Incoming query string, possibly carrying a bookmark
    pub query: Option<String>,
}

/// Request to change input values.
#[derive(Debug, Deserialize)]
pub struct UpdateInputsRequest {
    pub inputs: BTreeMap<String, Value>,
}

/// Response for an explicit bookmark.
#[derive(Debug, Serialize)]
pub struct BookmarkResponse {
    pub query: String,
    pub url: String,
}

/// Start a session. Under the automatic policy the initial state is
/// written to the location right away.
fn start_session(state: &WebAppState, query: Option<&str>) -> SessionResponse {
    let (id, handle, outcome) = state.create_session(query);
    let mut session = handle.lock();
    let mut warnings = outcome.warnings;
    if let Some(Err(e)) = session.flush() {
        warnings.push(format!("Automatic bookmark failed: {}", e));
    }
    SessionResponse::new(id, &session, warnings)
}

/// Create a session, replaying the bookmark in the request body.
pub async fn create_session(
    State(state): State<WebAppState>,
    Json(req): Json<CreateSessionRequest>,
) -> (StatusCode, Json<SessionResponse>) {
    let response = start_session(&state, req.query.as_deref());
    (StatusCode::CREATED, Json(response))
}

/// Open the app from a bookmarked URL (`/app?_inputs_&...`).
pub async fn open_app(
    State(state): State<WebAppState>,
    RawQuery(query): RawQuery,
) -> Json<SessionResponse> {
    Json(start_session(&state, query.as_deref()))
}

/// Get a session's current inputs.
pub async fn get_session(
    State(state): State<WebAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, WebError> {
    let handle = state
        .session(id)
        .ok_or_else(|| WebError::NotFound(format!("Session {} not found", id)))?;
    let session = handle.lock();
    Ok(Json(SessionResponse::new(id, &session, Vec::new())))
}

/// Change inputs, then run the end-of-cycle flush.
///
/// Under the automatic policy this rewrites the location; a failed
/// automatic capture is reported as a warning.
pub async fn update_inputs(
    State(state): State<WebAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInputsRequest>,
) -> Result<Json<SessionResponse>, WebError> {
    let handle = state
        .session(id)
        .ok_or_else(|| WebError::NotFound(format!("Session {} not found", id)))?;
    let mut session = handle.lock();

    if let Some(unknown) = req
        .inputs
        .keys()
        .find(|input| !session.registry().is_declared(input))
    {
        return Err(WebError::BadRequest(format!(
            "Unknown input '{}'",
            unknown
        )));
    }

    for (input, value) in req.inputs {
        session.set_input(&input, InputValue::from_api_json(value));
    }

    let mut warnings = Vec::new();
    if let Some(Err(e)) = session.flush() {
        warnings.push(format!("Automatic bookmark failed: {}", e));
    }

    Ok(Json(SessionResponse::new(id, &session, warnings)))
}

/// Explicit bookmark action.
pub async fn bookmark_session(
    State(state): State<WebAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookmarkResponse>, WebError> {
    let handle = state
        .session(id)
        .ok_or_else(|| WebError::NotFound(format!("Session {} not found", id)))?;
    let record = handle.lock().request_bookmark()?;

    let server = &state.config().server;
    let base = format!("http://{}:{}/app", server.host, server.port);
    Ok(Json(BookmarkResponse {
        query: record.to_query(),
        url: record.to_url(&base),
    }))
}

/// Close a session.
pub async fn delete_session(
    State(state): State<WebAppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, WebError> {
    if state.remove_session(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(WebError::NotFound(format!("Session {} not found", id)))
    }
}
