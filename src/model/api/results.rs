use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::common::{position::Position, tally::CandidateCount};

/// Public vote count for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CandidateResult {
    pub name: String,
    pub votes: usize,
}

/// Public results for one position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PositionResults {
    pub position: Position,
    pub title: String,
    pub candidates: Vec<CandidateResult>,
}

impl PositionResults {
    /// Public results for every position in the tally.
    pub fn from_tally(tally: BTreeMap<Position, Vec<CandidateCount>>) -> Vec<Self> {
        tally
            .into_iter()
            .map(|(position, counts)| Self {
                title: position.title(),
                position,
                candidates: counts
                    .into_iter()
                    .map(|count| CandidateResult {
                        name: count.name,
                        votes: count.votes,
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Admin view of one candidate: the count plus who voted for them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DashboardCandidate {
    pub name: String,
    pub votes: usize,
    pub voters: Vec<String>,
}

/// Admin view of one position. Closed positions carry no candidate table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DashboardPosition {
    pub position: Position,
    pub title: String,
    pub closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<DashboardCandidate>>,
}

impl DashboardPosition {
    pub fn from_tally(
        tally: BTreeMap<Position, Vec<CandidateCount>>,
        closed: &HashSet<Position>,
    ) -> Vec<Self> {
        tally
            .into_iter()
            .map(|(position, counts)| {
                let is_closed = closed.contains(&position);
                let candidates = (!is_closed).then(|| {
                    counts
                        .into_iter()
                        .map(|count| DashboardCandidate {
                            name: count.name,
                            votes: count.votes,
                            voters: count.voters,
                        })
                        .collect()
                });
                Self {
                    title: position.title(),
                    position,
                    closed: is_closed,
                    candidates,
                }
            })
            .collect()
    }
}
