//! API routes
//!
//! The HTTP layer is the UI host: it keeps session state between requests
//! and returns the full transcript after every action so any page can
//! re-render the chat top to bottom.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Guide, Locale};
use crate::conversation::{ConversationState, Message, Topic, UnknownTopic};
use crate::core::{Action, ControllerError};
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    configured: bool,
}

/// One entry in the quick-reply menu
#[derive(Debug, Serialize)]
pub struct TopicOption {
    pub id: Topic,
    pub label: &'static str,
    pub icon: &'static str,
}

impl TopicOption {
    fn menu(locale: Locale) -> Vec<Self> {
        Topic::ALL
            .into_iter()
            .map(|topic| TopicOption {
                id: topic,
                label: locale.topic_label(topic),
                icon: topic.icon(),
            })
            .collect()
    }
}

/// Everything a page needs to render a session
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub show_options: bool,
    pub waiting_for_input: bool,
    pub selected_topic: Option<Topic>,
    /// The topic menu while it is still on offer, empty afterwards
    pub options: Vec<TopicOption>,
}

impl SessionView {
    fn new(id: Uuid, created_at: DateTime<Utc>, state: &ConversationState, locale: Locale) -> Self {
        Self {
            id,
            created_at,
            messages: state.messages().to_vec(),
            show_options: state.show_options(),
            waiting_for_input: state.waiting_for_input(),
            selected_topic: state.selected_topic(),
            options: if state.show_options() {
                TopicOption::menu(locale)
            } else {
                Vec::new()
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::OptionsClosed => ApiError::Conflict(err.to_string()),
            ControllerError::EmptyInput => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        configured: state.controller.is_configured(),
    })
}

async fn topics(State(state): State<AppState>) -> Json<Vec<TopicOption>> {
    Json(TopicOption::menu(state.controller.locale()))
}

async fn guide(State(state): State<AppState>) -> Json<Guide> {
    Json(state.controller.locale().guide())
}

/// Apply an action to a session and render the result
async fn apply(state: &AppState, id: Uuid, action: Action) -> Result<SessionView, ApiError> {
    let controller = state.controller.clone();

    state
        .sessions
        .with(id, move |session| async move {
            let mut session = session.lock().await;
            let created_at = session.created_at;
            let conversation = controller.dispatch(&mut session.state, action).await?;
            Ok::<_, ApiError>(SessionView::new(
                id,
                created_at,
                conversation,
                controller.locale(),
            ))
        })
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))?
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let id = state.sessions.create().await;
    let view = apply(&state, id, Action::Initialize).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(apply(&state, id, Action::Initialize).await?))
}

async fn select_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let topic: Topic = request
        .topic
        .parse()
        .map_err(|e: UnknownTopic| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(apply(&state, id, Action::SelectTopic(topic)).await?))
}

async fn submit_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(
        apply(&state, id, Action::SubmitFreeText(request.text)).await?,
    ))
}

async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session not found: {}", id)))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/topics", get(topics))
        .route("/v1/guide", get(guide))
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/:id", get(get_session).delete(end_session))
        .route("/v1/sessions/:id/topic", post(select_topic))
        .route("/v1/sessions/:id/messages", post(submit_message))
}
