use super::{VoteInsert, VoteStore};
use crate::domain::models::{
    NewQuestion, NewTeam, NewVote, Question, Session, Team, Vote, Voter,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory store for engine tests. Mirrors the Postgres semantics,
/// including the uniqueness constraints and insertion ordering.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    sessions: Vec<Session>,
    questions: Vec<Question>,
    teams: Vec<Team>,
    voters: Vec<Voter>,
    votes: Vec<Vote>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VoteStore for MemStore {
    async fn create_session(
        &self,
        public_id: &str,
        name: &str,
        description: Option<&str>,
        questions: &[NewQuestion],
        teams: &[NewTeam],
    ) -> Result<Session> {
        let mut inner = self.inner.lock().unwrap();
        if inner.sessions.iter().any(|s| s.public_id == public_id) {
            bail!("duplicate public_id {public_id}");
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            public_id: public_id.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            started: false,
            ended: false,
            created_at: now,
            updated_at: now,
        };

        for (idx, question) in questions.iter().enumerate() {
            inner.questions.push(Question {
                id: Uuid::new_v4(),
                session_id: session.id,
                text: question.text.clone(),
                kind: question.kind,
                options: question.options.clone(),
                order_index: idx as i32,
            });
        }
        for (idx, team) in teams.iter().enumerate() {
            inner.teams.push(Team {
                id: Uuid::new_v4(),
                session_id: session.id,
                name: team.name.clone(),
                external_id: team.external_id.clone(),
                description: team.description.clone(),
                position: idx as i32,
            });
        }

        inner.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session_by_public_id(&self, public_id: &str) -> Result<Option<Session>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sessions
            .iter()
            .find(|s| s.public_id == public_id)
            .cloned())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.inner.lock().unwrap().sessions.clone())
    }

    async fn update_session_flags(
        &self,
        session_id: Uuid,
        started: Option<bool>,
        ended: Option<bool>,
    ) -> Result<Session> {
        let mut inner = self.inner.lock().unwrap();
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| anyhow::anyhow!("session {session_id} not found"))?;
        if let Some(started) = started {
            session.started = started;
        }
        if let Some(ended) = ended {
            session.ended = ended;
        }
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn replace_teams(&self, session_id: Uuid, teams: &[NewTeam]) -> Result<Vec<Team>> {
        let mut inner = self.inner.lock().unwrap();
        inner.teams.retain(|t| t.session_id != session_id);
        let mut inserted = Vec::with_capacity(teams.len());
        for (idx, team) in teams.iter().enumerate() {
            let row = Team {
                id: Uuid::new_v4(),
                session_id,
                name: team.name.clone(),
                external_id: team.external_id.clone(),
                description: team.description.clone(),
                position: idx as i32,
            };
            inner.teams.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn get_teams_by_session(&self, session_id: Uuid) -> Result<Vec<Team>> {
        let inner = self.inner.lock().unwrap();
        let mut teams: Vec<Team> = inner
            .teams
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect();
        teams.sort_by_key(|t| t.position);
        Ok(teams)
    }

    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.teams.iter().find(|t| t.id == team_id).cloned())
    }

    async fn get_questions_by_session(&self, session_id: Uuid) -> Result<Vec<Question>> {
        let inner = self.inner.lock().unwrap();
        let mut questions: Vec<Question> = inner
            .questions
            .iter()
            .filter(|q| q.session_id == session_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.order_index);
        Ok(questions)
    }

    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.questions.iter().find(|q| q.id == question_id).cloned())
    }

    async fn get_or_create_voter(&self, session_id: Uuid, identifier: &str) -> Result<Voter> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .voters
            .iter()
            .find(|v| v.session_id == session_id && v.identifier == identifier)
        {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let voter = Voter {
            id: Uuid::new_v4(),
            session_id,
            identifier: identifier.to_string(),
            first_seen_at: now,
            last_seen_at: now,
        };
        inner.voters.push(voter.clone());
        Ok(voter)
    }

    async fn touch_voter(&self, voter_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(voter) = inner.voters.iter_mut().find(|v| v.id == voter_id) {
            voter.last_seen_at = now;
        }
        Ok(())
    }

    async fn find_vote(&self, question_id: Uuid, voter_id: Uuid) -> Result<Option<Vote>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .votes
            .iter()
            .find(|v| v.question_id == question_id && v.voter_id == voter_id)
            .cloned())
    }

    async fn insert_vote(&self, vote: &NewVote) -> Result<VoteInsert> {
        let mut inner = self.inner.lock().unwrap();
        // Same contract as the schema constraint: at most one vote per
        // (question, voter) pair.
        if inner
            .votes
            .iter()
            .any(|v| v.question_id == vote.question_id && v.voter_id == vote.voter_id)
        {
            return Ok(VoteInsert::Duplicate);
        }
        let recorded = Vote {
            id: Uuid::new_v4(),
            session_id: vote.session_id,
            question_id: vote.question_id,
            team_id: vote.team_id,
            voter_id: vote.voter_id,
            voter_team_id: vote.voter_team_id,
            selected_option: vote.selected_option.clone(),
            numeric_value: vote.numeric_value,
            text_value: vote.text_value.clone(),
            created_at: vote.created_at,
        };
        inner.votes.push(recorded.clone());
        Ok(VoteInsert::Recorded(recorded))
    }

    async fn list_votes_by_session(&self, session_id: Uuid) -> Result<Vec<Vote>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .votes
            .iter()
            .filter(|v| v.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn list_votes_by_question(&self, question_id: Uuid) -> Result<Vec<Vote>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .votes
            .iter()
            .filter(|v| v.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn count_votes_by_session(&self, session_id: Uuid) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .votes
            .iter()
            .filter(|v| v.session_id == session_id)
            .count() as i64)
    }

    async fn count_voters_by_session(&self, session_id: Uuid) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .voters
            .iter()
            .filter(|v| v.session_id == session_id)
            .count() as i64)
    }
}
