use super::{VoteInsert, VoteStore};
use crate::domain::models::{
    NewQuestion, NewTeam, NewVote, Question, QuestionKind, Session, Team, Vote, Voter,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

/// Postgres-backed store. Uniqueness of `(question_id, voter_id)` votes
/// and of session `public_id`s is enforced by schema constraints, not by
/// application-level checks.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: Uuid,
    session_id: Uuid,
    text: String,
    kind: QuestionKind,
    options: Json<Vec<String>>,
    order_index: i32,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            session_id: row.session_id,
            text: row.text,
            kind: row.kind,
            options: row.options.0,
            order_index: row.order_index,
        }
    }
}

const SESSION_COLUMNS: &str =
    "id, public_id, name, description, started, ended, created_at, updated_at";

const VOTE_COLUMNS: &str = "id, session_id, question_id, team_id, voter_id, voter_team_id, \
     selected_option, numeric_value, text_value, created_at";

#[async_trait]
impl VoteStore for PgStore {
    async fn create_session(
        &self,
        public_id: &str,
        name: &str,
        description: Option<&str>,
        questions: &[NewQuestion],
        teams: &[NewTeam],
    ) -> Result<Session> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO voting_sessions (id, public_id, name, description, started, ended, created_at, updated_at)
            VALUES ($1, $2, $3, $4, FALSE, FALSE, $5, $5)
            RETURNING id, public_id, name, description, started, ended, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(public_id)
        .bind(name)
        .bind(description)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for (idx, question) in questions.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO questions (id, session_id, text, kind, options, order_index)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(session.id)
            .bind(&question.text)
            .bind(question.kind)
            .bind(Json(&question.options))
            .bind(idx as i32)
            .execute(&mut *tx)
            .await?;
        }

        for (idx, team) in teams.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO teams (id, session_id, name, external_id, description, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(session.id)
            .bind(&team.name)
            .bind(&team.external_id)
            .bind(&team.description)
            .bind(idx as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(session)
    }

    async fn get_session_by_public_id(&self, public_id: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM voting_sessions WHERE public_id = $1"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM voting_sessions ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn update_session_flags(
        &self,
        session_id: Uuid,
        started: Option<bool>,
        ended: Option<bool>,
    ) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            UPDATE voting_sessions
            SET started = COALESCE($2, started),
                ended = COALESCE($3, ended),
                updated_at = $4
            WHERE id = $1
            RETURNING id, public_id, name, description, started, ended, created_at, updated_at
            "#,
        )
        .bind(session_id)
        .bind(started)
        .bind(ended)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn replace_teams(&self, session_id: Uuid, teams: &[NewTeam]) -> Result<Vec<Team>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM teams WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        let mut inserted = Vec::with_capacity(teams.len());
        for (idx, team) in teams.iter().enumerate() {
            let row = sqlx::query_as::<_, Team>(
                r#"
                INSERT INTO teams (id, session_id, name, external_id, description, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, session_id, name, external_id, description, position
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(session_id)
            .bind(&team.name)
            .bind(&team.external_id)
            .bind(&team.description)
            .bind(idx as i32)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn get_teams_by_session(&self, session_id: Uuid) -> Result<Vec<Team>> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, session_id, name, external_id, description, position
            FROM teams
            WHERE session_id = $1
            ORDER BY position
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(teams)
    }

    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, session_id, name, external_id, description, position
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(team)
    }

    async fn get_questions_by_session(&self, session_id: Uuid) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, session_id, text, kind, options, order_index
            FROM questions
            WHERE session_id = $1
            ORDER BY order_index
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, session_id, text, kind, options, order_index
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Question::from))
    }

    async fn get_or_create_voter(&self, session_id: Uuid, identifier: &str) -> Result<Voter> {
        // Upsert so that two concurrent first contacts for the same
        // identifier resolve to the same row.
        let voter = sqlx::query_as::<_, Voter>(
            r#"
            INSERT INTO voters (id, session_id, identifier, first_seen_at, last_seen_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (session_id, identifier)
            DO UPDATE SET last_seen_at = voters.last_seen_at
            RETURNING id, session_id, identifier, first_seen_at, last_seen_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(identifier)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(voter)
    }

    async fn touch_voter(&self, voter_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE voters SET last_seen_at = $2 WHERE id = $1")
            .bind(voter_id)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_vote(&self, question_id: Uuid, voter_id: Uuid) -> Result<Option<Vote>> {
        let vote = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE question_id = $1 AND voter_id = $2"
        ))
        .bind(question_id)
        .bind(voter_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vote)
    }

    async fn insert_vote(&self, vote: &NewVote) -> Result<VoteInsert> {
        let result = sqlx::query_as::<_, Vote>(&format!(
            r#"
            INSERT INTO votes (id, session_id, question_id, team_id, voter_id, voter_team_id,
                               selected_option, numeric_value, text_value, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {VOTE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(vote.session_id)
        .bind(vote.question_id)
        .bind(vote.team_id)
        .bind(vote.voter_id)
        .bind(vote.voter_team_id)
        .bind(&vote.selected_option)
        .bind(vote.numeric_value)
        .bind(vote.text_value.as_deref())
        .bind(vote.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(recorded) => Ok(VoteInsert::Recorded(recorded)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(VoteInsert::Duplicate)
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn list_votes_by_session(&self, session_id: Uuid) -> Result<Vec<Vote>> {
        let votes = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE session_id = $1 ORDER BY created_at"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(votes)
    }

    async fn list_votes_by_question(&self, question_id: Uuid) -> Result<Vec<Vote>> {
        let votes = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE question_id = $1 ORDER BY created_at"
        ))
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(votes)
    }

    async fn count_votes_by_session(&self, session_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_voters_by_session(&self, session_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM voters WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
