use crate::domain::results::{self, CategoryResults, SessionResults};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/:id/results", get(generic_results))
        .route("/:id/results/team-selection", get(team_selection_results))
        .with_state(state)
}

async fn generic_results(
    State(state): State<SharedState>,
    Path(public_id): Path<String>,
) -> Result<Json<SessionResults>, AppError> {
    let report = results::session_results(state.store.as_ref(), &public_id).await?;
    Ok(Json(report))
}

async fn team_selection_results(
    State(state): State<SharedState>,
    Path(public_id): Path<String>,
) -> Result<Json<CategoryResults>, AppError> {
    let report = results::team_selection_results(state.store.as_ref(), &public_id).await?;
    Ok(Json(report))
}
