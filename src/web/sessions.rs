use crate::domain::lifecycle;
use crate::domain::models::{NewSession, NewTeam, Question, QuestionKind, Team};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct CreatedResponse {
    id: String,
    message: String,
    voting_url: String,
}

#[derive(Debug, Serialize)]
struct SessionSummary {
    id: String,
    name: String,
    started: bool,
    ended: bool,
    created_at: DateTime<Utc>,
    question_count: usize,
    team_count: usize,
    vote_count: i64,
}

#[derive(Debug, Serialize)]
struct QuestionView {
    id: Uuid,
    text: String,
    kind: QuestionKind,
    options: Vec<String>,
    order_index: i32,
}

#[derive(Debug, Serialize)]
struct TeamView {
    id: Uuid,
    name: String,
    external_id: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionDetail {
    id: String,
    name: String,
    description: Option<String>,
    started: bool,
    ended: bool,
    created_at: DateTime<Utc>,
    questions: Vec<QuestionView>,
    teams: Vec<TeamView>,
}

#[derive(Debug, Deserialize)]
struct ReplaceTeamsPayload {
    #[serde(default)]
    teams: Vec<NewTeam>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/:id", get(get_session))
        .route("/:id/teams", post(replace_teams))
        .route("/:id/start", post(start_session))
        .route("/:id/stop", post(stop_session))
        .with_state(state)
}

async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<NewSession>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let session = lifecycle::create_session(state.store.as_ref(), &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            voting_url: format!("/hlasovani/{}", session.public_id),
            message: "Voting session created successfully".to_string(),
            id: session.public_id,
        }),
    ))
}

async fn list_sessions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    let store = state.store.as_ref();
    let sessions = store.list_sessions().await?;

    let mut out = Vec::with_capacity(sessions.len());
    for session in sessions {
        let questions = store.get_questions_by_session(session.id).await?;
        let teams = store.get_teams_by_session(session.id).await?;
        let vote_count = store.count_votes_by_session(session.id).await?;
        out.push(SessionSummary {
            id: session.public_id,
            name: session.name,
            started: session.started,
            ended: session.ended,
            created_at: session.created_at,
            question_count: questions.len(),
            team_count: teams.len(),
            vote_count,
        });
    }
    Ok(Json(out))
}

async fn get_session(
    State(state): State<SharedState>,
    Path(public_id): Path<String>,
) -> Result<Json<SessionDetail>, AppError> {
    let store = state.store.as_ref();
    let session = store
        .get_session_by_public_id(&public_id)
        .await?
        .ok_or(AppError::SessionNotFound)?;
    let questions = store.get_questions_by_session(session.id).await?;
    let teams = store.get_teams_by_session(session.id).await?;

    Ok(Json(SessionDetail {
        id: session.public_id,
        name: session.name,
        description: session.description,
        started: session.started,
        ended: session.ended,
        created_at: session.created_at,
        questions: questions.into_iter().map(question_view).collect(),
        teams: teams.into_iter().map(team_view).collect(),
    }))
}

async fn replace_teams(
    State(state): State<SharedState>,
    Path(public_id): Path<String>,
    Json(payload): Json<ReplaceTeamsPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    lifecycle::replace_teams(state.store.as_ref(), &public_id, &payload.teams).await?;
    Ok(Json(MessageResponse {
        message: "Teams updated successfully".to_string(),
    }))
}

async fn start_session(
    State(state): State<SharedState>,
    Path(public_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let session = lifecycle::start_session(state.store.as_ref(), &public_id).await?;
    Ok(Json(MessageResponse {
        message: format!("Voting session {} started successfully", session.public_id),
    }))
}

async fn stop_session(
    State(state): State<SharedState>,
    Path(public_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let session = lifecycle::stop_session(state.store.as_ref(), &public_id).await?;
    Ok(Json(MessageResponse {
        message: format!("Voting session {} stopped successfully", session.public_id),
    }))
}

fn question_view(question: Question) -> QuestionView {
    QuestionView {
        id: question.id,
        text: question.text,
        kind: question.kind,
        options: question.options,
        order_index: question.order_index,
    }
}

fn team_view(team: Team) -> TeamView {
    TeamView {
        id: team.id,
        name: team.name,
        external_id: team.external_id,
        description: team.description,
    }
}
