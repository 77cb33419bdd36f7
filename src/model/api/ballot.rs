use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::position::Position,
    db::{candidate::Candidate, vote::NewVote},
    mongodb::Id,
};

pub const MIN_NAME_LENGTH: usize = 2;
pub const MIN_PIN_LENGTH: usize = 4;

pub const VOTE_RECORDED: &str = "Your vote has been successfully recorded.";

/// A filled-in ballot for one position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BallotForm {
    pub name: String,
    pub voter_id: String,
    /// ID of the chosen candidate.
    pub candidate: String,
    pub pin: String,
}

impl BallotForm {
    /// Check every field, reporting all the problems at once.
    pub fn validate(&self) -> Result<(), Vec<&'static str>> {
        let mut problems = Vec::new();
        if self.name.trim().chars().count() < MIN_NAME_LENGTH {
            problems.push("Name must be at least 2 characters.");
        }
        if self.voter_id.trim().is_empty() {
            problems.push("Voter ID is required.");
        }
        if self.candidate.trim().is_empty() {
            problems.push("Please select a candidate.");
        }
        if self.pin.chars().count() < MIN_PIN_LENGTH {
            problems.push("Pin must be at least 4 characters.");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Confirmation that a vote was recorded.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub id: String,
    pub position: Position,
    pub candidate: String,
    pub cast_at: DateTime<Utc>,
    pub message: String,
}

impl VoteReceipt {
    pub fn new(id: Id, vote: &NewVote, candidate: &Candidate) -> Self {
        Self {
            id: id.to_string(),
            position: vote.position.clone(),
            candidate: candidate.name.clone(),
            cast_at: vote.cast_at,
            message: VOTE_RECORDED.to_string(),
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl BallotForm {
        pub fn example(candidate: Id) -> Self {
            Self {
                name: "Chioma Nwosu".to_string(),
                voter_id: "AWT-0001".to_string(),
                candidate: candidate.to_string(),
                pin: "4821".to_string(),
            }
        }
    }
}
