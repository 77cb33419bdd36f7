use std::collections::{BTreeMap, HashMap};

use crate::model::{
    common::position::Position,
    db::{candidate::Candidate, vote::Vote},
    mongodb::Id,
};

/// Votes received by one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateCount {
    pub candidate_id: Id,
    pub name: String,
    pub votes: usize,
    /// Voter IDs behind the votes; direct votes count but are not listed.
    pub voters: Vec<String>,
}

/// Count the votes for every candidate, grouped by position.
///
/// Positions come out in slug order and candidates in the order given.
/// Candidates nobody voted for count zero, and votes referencing unknown
/// candidates are ignored.
pub fn tally(candidates: &[Candidate], votes: &[Vote]) -> BTreeMap<Position, Vec<CandidateCount>> {
    let mut by_candidate: HashMap<Id, (usize, Vec<String>)> = HashMap::new();
    for vote in votes {
        let (count, voters) = by_candidate.entry(vote.candidate_id).or_default();
        *count += 1;
        if let Some(ref voter_id) = vote.voter_id {
            voters.push(voter_id.clone());
        }
    }

    let mut positions: BTreeMap<Position, Vec<CandidateCount>> = BTreeMap::new();
    for candidate in candidates {
        let (votes, voters) = by_candidate.remove(&candidate.id).unwrap_or_default();
        positions
            .entry(candidate.position.clone())
            .or_default()
            .push(CandidateCount {
                candidate_id: candidate.id,
                name: candidate.name.clone(),
                votes,
                voters,
            });
    }
    positions
}
