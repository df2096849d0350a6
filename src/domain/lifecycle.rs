use crate::domain::allocator;
use crate::domain::models::{NewSession, NewTeam, Session, Team};
use crate::error::AppError;
use crate::store::VoteStore;

/// Creates a session together with its questions and teams in one atomic
/// setup step. Empty sessions are legal; they simply never accept votes
/// meaningfully.
pub async fn create_session(
    store: &dyn VoteStore,
    new: &NewSession,
) -> Result<Session, AppError> {
    if new.name.trim().is_empty() {
        return Err(AppError::InvalidPayload("session name is required".into()));
    }

    let public_id = allocator::allocate_public_id(store).await?;
    let session = store
        .create_session(
            &public_id,
            new.name.trim(),
            new.description.as_deref(),
            &new.questions,
            &new.teams,
        )
        .await?;

    tracing::info!(
        public_id = %session.public_id,
        questions = new.questions.len(),
        teams = new.teams.len(),
        "voting session created"
    );
    Ok(session)
}

/// Draft -> Active. Starting an already-active session is a no-op
/// success that still refreshes `updated_at` (the UI may double-submit).
pub async fn start_session(store: &dyn VoteStore, public_id: &str) -> Result<Session, AppError> {
    let session = store
        .get_session_by_public_id(public_id)
        .await?
        .ok_or(AppError::SessionNotFound)?;
    let updated = store
        .update_session_flags(session.id, Some(true), None)
        .await?;
    tracing::info!(public_id = %updated.public_id, "voting session started");
    Ok(updated)
}

/// Active -> Closed, or Draft -> Closed for a session that never started.
/// Stopping an already-closed session is a no-op success. There is no
/// transition out of Closed.
pub async fn stop_session(store: &dyn VoteStore, public_id: &str) -> Result<Session, AppError> {
    let session = store
        .get_session_by_public_id(public_id)
        .await?
        .ok_or(AppError::SessionNotFound)?;
    let updated = store
        .update_session_flags(session.id, None, Some(true))
        .await?;
    tracing::info!(public_id = %updated.public_id, "voting session stopped");
    Ok(updated)
}

/// Full replacement of the session's team set. Rejected once any votes
/// exist for the session, so historical votes always resolve to a team.
pub async fn replace_teams(
    store: &dyn VoteStore,
    public_id: &str,
    teams: &[NewTeam],
) -> Result<Vec<Team>, AppError> {
    let session = store
        .get_session_by_public_id(public_id)
        .await?
        .ok_or(AppError::SessionNotFound)?;

    if store.count_votes_by_session(session.id).await? > 0 {
        return Err(AppError::TeamsLockedByVotes);
    }

    let teams = store.replace_teams(session.id, teams).await?;
    tracing::info!(public_id = %session.public_id, teams = teams.len(), "team set replaced");
    Ok(teams)
}
