use crate::domain::models::{
    NewVote, Question, QuestionKind, Session, Team, Vote, VotePayload,
};
use crate::error::AppError;
use crate::store::{VoteInsert, VoteStore};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// One question/answer pair of a submission.
#[derive(Clone, Debug)]
pub struct VoteRequest {
    pub question_id: Uuid,
    pub team_id: Uuid,
    pub voter_team_id: Option<Uuid>,
    pub payload: VotePayload,
}

/// Batch outcome: best-effort per item, one rejection does not abort the
/// others.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub requested: usize,
    pub recorded: usize,
}

/// Records a single vote. Precondition checks run in a fixed order, each
/// with its own failure mode; nothing is written before they all pass.
/// The references are resolved before the voter is get-or-created, so a
/// rejected submission leaves no Voter row behind.
pub async fn submit_vote(
    store: &dyn VoteStore,
    session_public_id: &str,
    voter_identifier: &str,
    request: &VoteRequest,
) -> Result<Vote, AppError> {
    let session = resolve_active_session(store, session_public_id).await?;
    let refs = resolve_references(store, &session, request).await?;
    let voter = store
        .get_or_create_voter(session.id, voter_identifier)
        .await?;

    let vote = record_resolved(store, &session, voter.id, request, &refs).await?;
    store.touch_voter(voter.id, Utc::now()).await?;
    Ok(vote)
}

/// Records every answer of one participant in a single call. The voter is
/// resolved once by its persistent identifier, so a re-submission of the
/// same browser session is blocked per question by the uniqueness
/// constraint rather than minting a fresh voter.
pub async fn submit_batch(
    store: &dyn VoteStore,
    session_public_id: &str,
    voter_identifier: &str,
    requests: &[VoteRequest],
) -> Result<BatchOutcome, AppError> {
    let session = resolve_active_session(store, session_public_id).await?;
    let voter = store
        .get_or_create_voter(session.id, voter_identifier)
        .await?;

    let mut recorded = 0;
    for request in requests {
        match record_one(store, &session, voter.id, request).await {
            Ok(_) => recorded += 1,
            Err(AppError::Store(err)) => return Err(AppError::Store(err)),
            Err(rejection) => {
                tracing::debug!(
                    question_id = %request.question_id,
                    "batch item skipped: {rejection}"
                );
            }
        }
    }

    store.touch_voter(voter.id, Utc::now()).await?;
    Ok(BatchOutcome {
        requested: requests.len(),
        recorded,
    })
}

async fn resolve_active_session(
    store: &dyn VoteStore,
    public_id: &str,
) -> Result<Session, AppError> {
    let session = store
        .get_session_by_public_id(public_id)
        .await?
        .ok_or(AppError::SessionNotFound)?;
    if !session.is_active() {
        return Err(AppError::SessionNotActive);
    }
    Ok(session)
}

/// Question and subject team of a submission, confirmed to belong to the
/// session the vote targets.
struct ResolvedRefs {
    question: Question,
    team: Team,
}

async fn resolve_references(
    store: &dyn VoteStore,
    session: &Session,
    request: &VoteRequest,
) -> Result<ResolvedRefs, AppError> {
    let question = resolve_question(store, session, request.question_id).await?;
    let team = resolve_team(store, session, request.team_id, "team").await?;
    if let Some(voter_team_id) = request.voter_team_id {
        resolve_team(store, session, voter_team_id, "voter team").await?;
    }
    Ok(ResolvedRefs { question, team })
}

async fn record_one(
    store: &dyn VoteStore,
    session: &Session,
    voter_id: Uuid,
    request: &VoteRequest,
) -> Result<Vote, AppError> {
    let refs = resolve_references(store, session, request).await?;
    record_resolved(store, session, voter_id, request, &refs).await
}

async fn record_resolved(
    store: &dyn VoteStore,
    session: &Session,
    voter_id: Uuid,
    request: &VoteRequest,
    refs: &ResolvedRefs,
) -> Result<Vote, AppError> {
    // Pre-check is an optimization for the common double-submit; the
    // storage constraint remains the actual defense under concurrency.
    if store.find_vote(refs.question.id, voter_id).await?.is_some() {
        return Err(AppError::DuplicateVote);
    }

    let vote = validate_payload(session, &refs.question, &refs.team, voter_id, request)?;
    match store.insert_vote(&vote).await? {
        VoteInsert::Recorded(recorded) => Ok(recorded),
        VoteInsert::Duplicate => Err(AppError::DuplicateVote),
    }
}

async fn resolve_question(
    store: &dyn VoteStore,
    session: &Session,
    question_id: Uuid,
) -> Result<Question, AppError> {
    let question = store
        .get_question(question_id)
        .await?
        .filter(|q| q.session_id == session.id)
        .ok_or_else(|| {
            AppError::InvalidReference(format!(
                "question {question_id} does not belong to this session"
            ))
        })?;
    Ok(question)
}

async fn resolve_team(
    store: &dyn VoteStore,
    session: &Session,
    team_id: Uuid,
    label: &str,
) -> Result<Team, AppError> {
    let team = store
        .get_team(team_id)
        .await?
        .filter(|t| t.session_id == session.id)
        .ok_or_else(|| {
            AppError::InvalidReference(format!("{label} {team_id} does not belong to this session"))
        })?;
    Ok(team)
}

/// Matches the payload against the question kind and builds the row with
/// exactly one value column populated. For team-selection questions the
/// recorded option is always the subject team's name.
fn validate_payload(
    session: &Session,
    question: &Question,
    team: &Team,
    voter_id: Uuid,
    request: &VoteRequest,
) -> Result<NewVote, AppError> {
    let mut vote = NewVote {
        session_id: session.id,
        question_id: question.id,
        team_id: team.id,
        voter_id,
        voter_team_id: request.voter_team_id,
        selected_option: None,
        numeric_value: None,
        text_value: None,
        created_at: Utc::now(),
    };

    match (question.kind, &request.payload) {
        (QuestionKind::Rating, VotePayload::Rating(value)) => {
            if !value.is_finite() {
                return Err(AppError::InvalidPayload(
                    "rating value must be a finite number".into(),
                ));
            }
            vote.numeric_value = Some(*value);
        }
        (QuestionKind::Rating, _) => {
            return Err(AppError::InvalidPayload(
                "rating question requires a numeric value".into(),
            ));
        }
        (QuestionKind::SingleChoice, VotePayload::Choice(option)) => {
            if option.trim().is_empty() {
                return Err(AppError::InvalidPayload(
                    "single-choice question requires a selected option".into(),
                ));
            }
            vote.selected_option = Some(option.clone());
        }
        (QuestionKind::SingleChoice, _) => {
            return Err(AppError::InvalidPayload(
                "single-choice question requires a selected option".into(),
            ));
        }
        (QuestionKind::TeamSelection, VotePayload::Choice(_)) => {
            vote.selected_option = Some(team.name.clone());
        }
        (QuestionKind::TeamSelection, _) => {
            return Err(AppError::InvalidPayload(
                "team-selection question requires a selected option".into(),
            ));
        }
    }

    Ok(vote)
}
