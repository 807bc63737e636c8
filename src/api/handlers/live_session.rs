use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::ListLiveSessionsQuery;
use crate::api::dtos::responses::{LiveSessionResponse, UpdateLiveSessionResponse};
use crate::domain::models::live_session::{SessionDraft, SessionPatch};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_live_session(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<SessionDraft>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.engine.create_session(&actor, payload).await?;
    let phase = state.engine.phase_of(&session);

    info!("Actor {} created live session {}", actor.id, session.slug);
    Ok((StatusCode::CREATED, Json(LiveSessionResponse::summary(session, phase))))
}

pub async fn get_live_session(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.engine.get_session(&id).await?;
    Ok(Json(LiveSessionResponse::from(detail)))
}

pub async fn update_live_session(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<SessionPatch>,
) -> Result<impl IntoResponse, AppError> {
    let (session, changes) = state.engine.update_session(&actor, &id, payload).await?;
    let phase = state.engine.phase_of(&session);

    Ok(Json(UpdateLiveSessionResponse {
        session: LiveSessionResponse::summary(session, phase),
        changes: (&changes).into(),
    }))
}

pub async fn list_course_live_sessions(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(course_id): Path<String>,
    Query(query): Query<ListLiveSessionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.engine.list_course_sessions(&course_id, query.include_cancelled).await?;
    let body: Vec<LiveSessionResponse> = sessions
        .into_iter()
        .map(|(session, phase)| LiveSessionResponse::summary(session, phase))
        .collect();
    Ok(Json(body))
}
