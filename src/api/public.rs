use chrono::Utc;
use mongodb::bson::doc;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            candidate::CandidateDescription,
            position::{PositionStatus, ScheduleDay},
            results::PositionResults,
            voter::{PinCheck, PinVerdict},
        },
        common::position::Position,
        db::{candidate::Candidate, closed_position::ClosedPosition, vote::Vote, voter::Voter},
        mongodb::Coll,
    },
    Config,
};

use super::common::{closed_positions, current_tally, find_candidates, voting_status};

pub fn routes() -> Vec<Route> {
    routes![
        schedule,
        positions,
        position_status,
        candidates,
        position_candidates,
        results,
        verify_pin,
    ]
}

/// The election timetable, one entry per voting day in date order.
#[get("/schedule")]
fn schedule(config: &State<Config>) -> Json<Vec<ScheduleDay>> {
    let schedule = config.schedule();
    let mut days = schedule
        .days()
        .iter()
        .map(|day| ScheduleDay::new(schedule.month, day))
        .collect::<Vec<_>>();
    days.sort_by_key(|day| day.day);
    Json(days)
}

#[get("/positions")]
async fn positions(
    config: &State<Config>,
    closed: Coll<ClosedPosition>,
) -> Result<Json<Vec<PositionStatus>>> {
    let schedule = config.schedule();
    let closed = closed_positions(&closed).await?;
    let now = Utc::now();

    let statuses = schedule
        .positions()
        .map(|(position, day)| {
            let status = schedule
                .status(position, now)
                .closed_if(closed.contains(position));
            PositionStatus::new(position, Some(day), status)
        })
        .collect();
    Ok(Json(statuses))
}

#[get("/positions/<position>")]
async fn position_status(
    position: Position,
    config: &State<Config>,
    closed: Coll<ClosedPosition>,
) -> Result<Json<PositionStatus>> {
    let schedule = config.schedule();
    let day = schedule
        .voting_day(&position)
        .ok_or_else(|| Error::not_found(format!("Position '{position}'")))?;
    let status = voting_status(&position, schedule, &closed, Utc::now()).await?;
    Ok(Json(PositionStatus::new(&position, Some(day), status)))
}

#[get("/candidates")]
async fn candidates(candidates: Coll<Candidate>) -> Result<Json<Vec<CandidateDescription>>> {
    let found = find_candidates(&candidates, None).await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

/// Candidates standing for one position. Unscheduled positions simply have none.
#[get("/positions/<position>/candidates")]
async fn position_candidates(
    position: Position,
    candidates: Coll<Candidate>,
) -> Result<Json<Vec<CandidateDescription>>> {
    let found = find_candidates(&candidates, doc! { "position": &position }).await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

#[get("/results")]
async fn results(
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
) -> Result<Json<Vec<PositionResults>>> {
    let tally = current_tally(&candidates, &votes).await?;
    Ok(Json(PositionResults::from_tally(tally)))
}

/// Check a voter's pin without casting anything.
#[post("/voters/verify", data = "<check>", format = "json")]
async fn verify_pin(check: Json<PinCheck>, voters: Coll<Voter>) -> Result<Json<PinVerdict>> {
    let voter = voters
        .find_one(doc! { "voter_id": check.voter_id.trim() }, None)
        .await?;
    let valid = voter.map_or(false, |voter| voter.verify_pin(&check.pin));
    Ok(Json(PinVerdict { valid }))
}
