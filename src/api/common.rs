use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, Document},
    options::FindOptions,
};
use rocket::futures::TryStreamExt;

use crate::error::Result;
use crate::model::{
    common::{
        position::Position,
        schedule::{ElectionSchedule, VotingStatus},
        tally::{tally, CandidateCount},
    },
    db::{candidate::Candidate, closed_position::ClosedPosition, vote::Vote},
    mongodb::Coll,
};

/// Every position an admin has closed.
pub async fn closed_positions(closed: &Coll<ClosedPosition>) -> Result<HashSet<Position>> {
    let positions = closed
        .find(None, None)
        .await?
        .map_ok(|closed| closed.position)
        .try_collect()
        .await?;
    Ok(positions)
}

/// Whether an admin has closed `position`.
pub async fn is_closed(position: &Position, closed: &Coll<ClosedPosition>) -> Result<bool> {
    let count = closed
        .count_documents(doc! { "position": position }, None)
        .await?;
    Ok(count > 0)
}

/// The timetable's verdict on `position` at `now`, overridden by any admin closure.
pub async fn voting_status(
    position: &Position,
    schedule: &ElectionSchedule,
    closed: &Coll<ClosedPosition>,
    now: DateTime<Utc>,
) -> Result<VotingStatus> {
    let status = schedule.status(position, now);
    if status == VotingStatus::UnknownPosition {
        return Ok(status);
    }
    Ok(status.closed_if(is_closed(position, closed).await?))
}

/// Candidates matching `filter`, oldest first.
pub async fn find_candidates(
    candidates: &Coll<Candidate>,
    filter: impl Into<Option<Document>>,
) -> Result<Vec<Candidate>> {
    let oldest_first = FindOptions::builder().sort(doc! { "_id": 1 }).build();
    let found = candidates
        .find(filter, oldest_first)
        .await?
        .try_collect()
        .await?;
    Ok(found)
}

/// Count every vote cast so far.
pub async fn current_tally(
    candidates: &Coll<Candidate>,
    votes: &Coll<Vote>,
) -> Result<BTreeMap<Position, Vec<CandidateCount>>> {
    let candidates = find_candidates(candidates, None).await?;
    let votes: Vec<Vote> = votes.find(None, None).await?.try_collect().await?;
    Ok(tally(&candidates, &votes))
}
