use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a question is answered and how its votes are aggregated.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "question_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Rating,
    SingleChoice,
    TeamSelection,
}

/// Observable session phase. `ended` dominates `started`: a session that
/// was stopped without ever starting is still `Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Draft,
    Active,
    Closed,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub public_id: String,
    pub name: String,
    pub description: Option<String>,
    pub started: bool,
    pub ended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        if self.ended {
            SessionPhase::Closed
        } else if self.started {
            SessionPhase::Active
        } else {
            SessionPhase::Draft
        }
    }

    /// Vote ingestion only accepts sessions in the `Active` phase.
    pub fn is_active(&self) -> bool {
        self.phase() == SessionPhase::Active
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub session_id: Uuid,
    pub text: String,
    pub kind: QuestionKind,
    /// Labeled options for `single_choice`; empty for `team_selection`,
    /// where the session's teams are the option set.
    pub options: Vec<String>,
    pub order_index: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub session_id: Uuid,
    pub name: String,
    /// Correlation key of an external system, opaque to the engine.
    pub external_id: Option<String>,
    pub description: Option<String>,
    /// Insertion index within the session; the stable ordering key for
    /// winner tie-breaks.
    pub position: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Voter {
    pub id: Uuid,
    pub session_id: Uuid,
    pub identifier: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_id: Uuid,
    /// The team being voted FOR.
    pub team_id: Uuid,
    pub voter_id: Uuid,
    /// The team the voter represents; team-selection mode only.
    pub voter_team_id: Option<Uuid>,
    pub selected_option: Option<String>,
    pub numeric_value: Option<f64>,
    pub text_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Tagged vote value, validated against the question kind at ingestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum VotePayload {
    Rating(f64),
    Choice(String),
    /// Reserved for future question kinds; rejected by the current ones.
    Text(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewSession {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<NewQuestion>,
    #[serde(default)]
    pub teams: Vec<NewTeam>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    #[serde(alias = "question_type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Fully validated vote, ready for the store. Exactly one of the three
/// value columns is populated, matching the question kind.
#[derive(Clone, Debug)]
pub struct NewVote {
    pub session_id: Uuid,
    pub question_id: Uuid,
    pub team_id: Uuid,
    pub voter_id: Uuid,
    pub voter_team_id: Option<Uuid>,
    pub selected_option: Option<String>,
    pub numeric_value: Option<f64>,
    pub text_value: Option<String>,
    pub created_at: DateTime<Utc>,
}
