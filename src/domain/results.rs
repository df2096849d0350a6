use crate::domain::models::{Question, QuestionKind, Session, Team, Vote};
use crate::error::AppError;
use crate::store::VoteStore;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Sentinel option label for votes recorded without a selected option
/// (legacy rows; ingestion no longer produces them).
const NO_OPTION: &str = "no_option";

/// Per-team statistics of one question in the generic report.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TeamStats {
    Rating {
        vote_count: usize,
        average_rating: f64,
    },
    Options {
        vote_count: usize,
        option_counts: BTreeMap<String, usize>,
    },
}

#[derive(Debug, Serialize)]
pub struct QuestionResults {
    pub question_id: uuid::Uuid,
    pub text: String,
    pub kind: QuestionKind,
    pub teams: BTreeMap<String, TeamStats>,
}

/// The generic results report: one entry per question, per team.
#[derive(Debug, Serialize)]
pub struct SessionResults {
    pub session_id: String,
    pub session_name: String,
    pub total_voters: i64,
    pub results: Vec<QuestionResults>,
}

/// Winner of one team-selection category, with traceability of who voted
/// for it.
#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryWinner {
    pub winning_team: Option<String>,
    pub votes_received: usize,
    pub voting_teams: Vec<String>,
    pub self_votes: usize,
}

/// The specialized team-selection report, keyed by question text.
#[derive(Debug, Serialize)]
pub struct CategoryResults {
    pub session_id: String,
    pub session_name: String,
    pub results: BTreeMap<String, CategoryWinner>,
}

/// One aggregation pass over the vote log of a session. Both report
/// shapes are projections of the tallies this returns, so they cannot
/// diverge.
pub fn aggregate<'a>(
    questions: &'a [Question],
    teams: &'a [Team],
    votes: &[Vote],
) -> Vec<QuestionTally<'a>> {
    let team_index: HashMap<uuid::Uuid, usize> =
        teams.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
    let team_names: HashMap<uuid::Uuid, &str> =
        teams.iter().map(|t| (t.id, t.name.as_str())).collect();

    let mut tallies: Vec<QuestionTally<'a>> = questions
        .iter()
        .map(|question| QuestionTally {
            question,
            teams: teams.iter().map(TeamTally::new).collect(),
        })
        .collect();
    let question_index: HashMap<uuid::Uuid, usize> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| (q.id, i))
        .collect();

    for vote in votes {
        // Votes referencing entities outside the current composition are
        // unreachable through ingestion; skip rather than poison the report.
        let Some(&qi) = question_index.get(&vote.question_id) else {
            continue;
        };
        let Some(&ti) = team_index.get(&vote.team_id) else {
            continue;
        };

        let tally = &mut tallies[qi].teams[ti];
        tally.vote_count += 1;

        if let Some(value) = vote.numeric_value {
            tally.numeric_sum += value;
            tally.numeric_count += 1;
        }

        let option = vote
            .selected_option
            .as_deref()
            .filter(|o| !o.is_empty())
            .unwrap_or(NO_OPTION);
        *tally.option_counts.entry(option.to_string()).or_insert(0) += 1;

        if let Some(voter_team_id) = vote.voter_team_id {
            if let Some(name) = team_names.get(&voter_team_id) {
                if !tally.voting_teams.iter().any(|n| n == name) {
                    tally.voting_teams.push((*name).to_string());
                }
            }
            if voter_team_id == vote.team_id {
                tally.self_votes += 1;
            }
        }
    }

    tallies
}

#[derive(Debug)]
pub struct QuestionTally<'a> {
    pub question: &'a Question,
    /// Indexed in session-insertion order of the teams; that order is the
    /// tie-break key for winners.
    pub teams: Vec<TeamTally<'a>>,
}

#[derive(Debug)]
pub struct TeamTally<'a> {
    pub team: &'a Team,
    pub vote_count: usize,
    numeric_sum: f64,
    numeric_count: usize,
    pub option_counts: BTreeMap<String, usize>,
    /// Distinct voter-team names, first-seen order.
    pub voting_teams: Vec<String>,
    pub self_votes: usize,
}

impl<'a> TeamTally<'a> {
    fn new(team: &'a Team) -> Self {
        Self {
            team,
            vote_count: 0,
            numeric_sum: 0.0,
            numeric_count: 0,
            option_counts: BTreeMap::new(),
            voting_teams: Vec::new(),
            self_votes: 0,
        }
    }

    /// Mean over votes that carry a numeric value; votes without one
    /// count toward `vote_count` but not toward the denominator. Rounded
    /// half-up to two decimals.
    pub fn average_rating(&self) -> f64 {
        if self.numeric_count == 0 {
            return 0.0;
        }
        round2(self.numeric_sum / self.numeric_count as f64)
    }
}

impl QuestionTally<'_> {
    /// The team with the strictly highest vote count. Ties resolve to the
    /// first team in session-insertion order; no votes at all means no
    /// winner.
    pub fn winner(&self) -> Option<&TeamTally<'_>> {
        let mut winner: Option<&TeamTally<'_>> = None;
        for tally in &self.teams {
            let beats = match winner {
                Some(current) => tally.vote_count > current.vote_count,
                None => tally.vote_count > 0,
            };
            if beats {
                winner = Some(tally);
            }
        }
        winner
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Assembles the generic report for a session.
pub async fn session_results(
    store: &dyn VoteStore,
    public_id: &str,
) -> Result<SessionResults, AppError> {
    let (session, tallies_input) = load(store, public_id).await?;
    let (questions, teams, votes) = &tallies_input;
    let total_voters = store.count_voters_by_session(session.id).await?;

    let results = aggregate(questions, teams, votes)
        .iter()
        .map(|tally| QuestionResults {
            question_id: tally.question.id,
            text: tally.question.text.clone(),
            kind: tally.question.kind,
            teams: tally
                .teams
                .iter()
                .map(|t| (t.team.name.clone(), project_stats(tally.question.kind, t)))
                .collect(),
        })
        .collect();

    Ok(SessionResults {
        session_id: session.public_id,
        session_name: session.name,
        total_voters,
        results,
    })
}

/// Assembles the specialized category report over the session's
/// team-selection questions.
pub async fn team_selection_results(
    store: &dyn VoteStore,
    public_id: &str,
) -> Result<CategoryResults, AppError> {
    let (session, tallies_input) = load(store, public_id).await?;
    let (questions, teams, votes) = &tallies_input;

    if !questions
        .iter()
        .any(|q| q.kind == QuestionKind::TeamSelection)
    {
        return Err(AppError::InvalidPayload(
            "session has no team-selection questions".into(),
        ));
    }

    let results = aggregate(questions, teams, votes)
        .iter()
        .filter(|tally| tally.question.kind == QuestionKind::TeamSelection)
        .map(|tally| {
            let winner = match tally.winner() {
                Some(top) => CategoryWinner {
                    winning_team: Some(top.team.name.clone()),
                    votes_received: top.vote_count,
                    voting_teams: top.voting_teams.clone(),
                    self_votes: top.self_votes,
                },
                None => CategoryWinner {
                    winning_team: None,
                    votes_received: 0,
                    voting_teams: Vec::new(),
                    self_votes: 0,
                },
            };
            (tally.question.text.clone(), winner)
        })
        .collect();

    Ok(CategoryResults {
        session_id: session.public_id,
        session_name: session.name,
        results,
    })
}

fn project_stats(kind: QuestionKind, tally: &TeamTally<'_>) -> TeamStats {
    match kind {
        QuestionKind::Rating => TeamStats::Rating {
            vote_count: tally.vote_count,
            average_rating: tally.average_rating(),
        },
        QuestionKind::SingleChoice | QuestionKind::TeamSelection => TeamStats::Options {
            vote_count: tally.vote_count,
            option_counts: tally.option_counts.clone(),
        },
    }
}

type AggregationInput = (Vec<Question>, Vec<Team>, Vec<Vote>);

async fn load(
    store: &dyn VoteStore,
    public_id: &str,
) -> Result<(Session, AggregationInput), AppError> {
    let session = store
        .get_session_by_public_id(public_id)
        .await?
        .ok_or(AppError::SessionNotFound)?;
    let questions = store.get_questions_by_session(session.id).await?;
    let teams = store.get_teams_by_session(session.id).await?;
    let votes = store.list_votes_by_session(session.id).await?;
    Ok((session, (questions, teams, votes)))
}
