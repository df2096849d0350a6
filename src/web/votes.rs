use crate::domain::ingest::{self, VoteRequest};
use crate::domain::models::VotePayload;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct VoteItem {
    question_id: Uuid,
    team_id: Uuid,
    #[serde(default)]
    voter_team_id: Option<Uuid>,
    #[serde(default)]
    option_selected: Option<String>,
    #[serde(default)]
    numeric_value: Option<f64>,
    #[serde(default)]
    text_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SingleVotePayload {
    #[serde(flatten)]
    item: VoteItem,
    #[serde(default)]
    voter_identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchVotePayload {
    #[serde(default)]
    voter_identifier: Option<String>,
    #[serde(default)]
    votes: Vec<VoteItem>,
}

#[derive(Debug, Serialize)]
struct VoteResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct BatchVoteResponse {
    message: String,
    votes_submitted: usize,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/:id/vote", post(submit_vote))
        .route("/:id/votes", post(submit_votes))
        .with_state(state)
}

async fn submit_vote(
    State(state): State<SharedState>,
    Path(public_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SingleVotePayload>,
) -> Result<(StatusCode, Json<VoteResponse>), AppError> {
    let identifier = payload
        .voter_identifier
        .unwrap_or_else(|| fingerprint(&headers));

    ingest::submit_vote(
        state.store.as_ref(),
        &public_id,
        &identifier,
        &vote_request(payload.item),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(VoteResponse {
            message: "Vote submitted successfully".to_string(),
        }),
    ))
}

async fn submit_votes(
    State(state): State<SharedState>,
    Path(public_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<BatchVotePayload>,
) -> Result<(StatusCode, Json<BatchVoteResponse>), AppError> {
    let identifier = payload
        .voter_identifier
        .unwrap_or_else(|| fingerprint(&headers));
    let requests: Vec<VoteRequest> = payload.votes.into_iter().map(vote_request).collect();

    let outcome =
        ingest::submit_batch(state.store.as_ref(), &public_id, &identifier, &requests).await?;

    Ok((
        StatusCode::CREATED,
        Json(BatchVoteResponse {
            message: format!("{} votes submitted successfully", outcome.recorded),
            votes_submitted: outcome.recorded,
        }),
    ))
}

fn vote_request(item: VoteItem) -> VoteRequest {
    let payload = if let Some(value) = item.numeric_value {
        VotePayload::Rating(value)
    } else if let Some(option) = item.option_selected {
        VotePayload::Choice(option)
    } else if let Some(text) = item.text_value {
        VotePayload::Text(text)
    } else {
        // Ingestion validates against the question kind; an empty choice
        // is only acceptable for team-selection questions.
        VotePayload::Choice(String::new())
    };

    VoteRequest {
        question_id: item.question_id,
        team_id: item.team_id,
        voter_team_id: item.voter_team_id,
        payload,
    }
}

/// Anonymous voter identifier for clients that do not supply a token:
/// a digest of network address and client fingerprint, stable for the
/// same browser across requests.
fn fingerprint(headers: &HeaderMap) -> String {
    let addr = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or("unknown")
        .trim();
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let mut hasher = Sha256::new();
    hasher.update(addr.as_bytes());
    hasher.update(b"|");
    hasher.update(user_agent.as_bytes());
    let digest = hasher.finalize();

    general_purpose::URL_SAFE_NO_PAD.encode(digest)[..16].to_string()
}
