#[cfg(test)]
pub mod mem;
pub mod pg;

use crate::domain::models::{
    NewQuestion, NewTeam, NewVote, Question, Session, Team, Vote, Voter,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Outcome of a vote insert. The storage layer enforces the
/// `(question_id, voter_id)` uniqueness constraint atomically; a
/// constraint rejection is reported as `Duplicate`, never as an error,
/// so the engine can tell an expected duplicate from a storage fault.
#[derive(Debug)]
pub enum VoteInsert {
    Recorded(Vote),
    Duplicate,
}

/// Durable storage contract of the voting core. All coordination is
/// delegated to the store's transactional guarantees; the engines never
/// block on each other in-process.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Creates the session together with its questions and teams in one
    /// atomic setup step. Fails on a `public_id` collision.
    async fn create_session(
        &self,
        public_id: &str,
        name: &str,
        description: Option<&str>,
        questions: &[NewQuestion],
        teams: &[NewTeam],
    ) -> Result<Session>;

    async fn get_session_by_public_id(&self, public_id: &str) -> Result<Option<Session>>;

    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Applies the given flags and refreshes `updated_at`, even when the
    /// flags do not change (lifecycle no-ops still touch the row).
    async fn update_session_flags(
        &self,
        session_id: Uuid,
        started: Option<bool>,
        ended: Option<bool>,
    ) -> Result<Session>;

    /// Full delete-and-reinsert of the session's team set.
    async fn replace_teams(&self, session_id: Uuid, teams: &[NewTeam]) -> Result<Vec<Team>>;

    /// Teams in session-insertion order.
    async fn get_teams_by_session(&self, session_id: Uuid) -> Result<Vec<Team>>;

    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>>;

    /// Questions ordered by `order_index`.
    async fn get_questions_by_session(&self, session_id: Uuid) -> Result<Vec<Question>>;

    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>>;

    /// Resolves the voter for `(session_id, identifier)`, creating it on
    /// first contact. Must be race-safe: two concurrent calls for the
    /// same identifier resolve to the same row.
    async fn get_or_create_voter(&self, session_id: Uuid, identifier: &str) -> Result<Voter>;

    async fn touch_voter(&self, voter_id: Uuid, now: DateTime<Utc>) -> Result<()>;

    async fn find_vote(&self, question_id: Uuid, voter_id: Uuid) -> Result<Option<Vote>>;

    async fn insert_vote(&self, vote: &NewVote) -> Result<VoteInsert>;

    async fn list_votes_by_session(&self, session_id: Uuid) -> Result<Vec<Vote>>;

    async fn list_votes_by_question(&self, question_id: Uuid) -> Result<Vec<Vote>>;

    async fn count_votes_by_session(&self, session_id: Uuid) -> Result<i64>;

    async fn count_voters_by_session(&self, session_id: Uuid) -> Result<i64>;
}
