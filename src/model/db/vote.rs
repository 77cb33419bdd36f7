use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::position::Position,
    db::{candidate::Candidate, voter::Voter},
    mongodb::Id,
};

/// A vote about to be recorded. The position is copied from the candidate so
/// that "one vote per voter per position" can be a unique index.
///
/// Votes are not flattened into a `Core` like the other types, because the
/// ObjectId and datetime fields must reach the BSON deserializer directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVote {
    /// Absent for direct votes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voter_id: Option<String>,
    pub candidate_id: Id,
    pub position: Position,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl NewVote {
    /// A ballot from a verified voter.
    pub fn for_voter(voter: &Voter, candidate: &Candidate, cast_at: DateTime<Utc>) -> Self {
        Self {
            voter_id: Some(voter.voter_id.clone()),
            candidate_id: candidate.id,
            position: candidate.position.clone(),
            cast_at,
        }
    }

    /// An anonymous vote cast straight against a candidate.
    pub fn direct(candidate: &Candidate, cast_at: DateTime<Utc>) -> Self {
        Self {
            voter_id: None,
            candidate_id: candidate.id,
            position: candidate.position.clone(),
            cast_at,
        }
    }
}

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(default)]
    pub voter_id: Option<String>,
    pub candidate_id: Id,
    pub position: Position,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}
