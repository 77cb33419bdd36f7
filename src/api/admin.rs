use chrono::Utc;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    options::UpdateOptions,
};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            admin::AdminCredentials,
            auth::AuthToken,
            candidate::{CandidateDescription, CandidateSpec},
            position::ClosePositionRequest,
            results::DashboardPosition,
            voter::{VoterRegistration, VoterSummary},
        },
        common::position::Position,
        db::{
            admin::{Admin, NewAdmin},
            candidate::{Candidate, NewCandidate},
            closed_position::ClosedPosition,
            vote::Vote,
            voter::{NewVoter, Voter},
        },
        mongodb::{inserted_id, is_duplicate_key_error, Coll, Id},
    },
};

use super::common::{closed_positions, current_tally};

pub fn routes() -> Vec<Route> {
    routes![
        get_admins,
        create_admin,
        delete_admin,
        create_candidate,
        delete_candidate,
        get_voters,
        register_voter,
        get_closed_positions,
        close_position,
        dashboard,
    ]
}

#[get("/admins")]
async fn get_admins(_token: AuthToken, admins: Coll<Admin>) -> Result<Json<Vec<String>>> {
    let admin_list: Vec<Admin> = admins.find(None, None).await?.try_collect().await?;
    let admin_names = admin_list
        .into_iter()
        .map(|admin| admin.admin.username)
        .collect();
    Ok(Json(admin_names))
}

#[post("/admins", data = "<new_admin>", format = "json")]
async fn create_admin(
    _token: AuthToken,
    new_admin: Json<AdminCredentials>,
    admins: Coll<NewAdmin>,
) -> Result<()> {
    // Check username uniqueness.
    let filter = doc! {
        "username": &new_admin.username,
    };
    if admins.find_one(filter, None).await?.is_some() {
        return Err(Error::Status(
            Status::Conflict,
            format!("Admin username already in use: {}", new_admin.username),
        ));
    }

    let admin: NewAdmin = new_admin.0.try_into()?;
    insert_admin(&admins, &admin).await?;
    info!("Created admin '{}'", admin.username);
    Ok(())
}

/// Insert an admin, reporting a username taken by a concurrent request as a conflict.
async fn insert_admin(admins: &Coll<NewAdmin>, admin: &NewAdmin) -> Result<()> {
    match admins.insert_one(admin, None).await {
        Ok(_) => Ok(()),
        Err(e) if is_duplicate_key_error(&e) => Err(Error::Status(
            Status::Conflict,
            format!("Admin username already in use: {}", admin.username),
        )),
        Err(e) => Err(e.into()),
    }
}

#[delete("/admins", data = "<username>", format = "json")]
async fn delete_admin(
    _token: AuthToken,
    username: Json<String>,
    admins: Coll<Admin>,
) -> Result<()> {
    // Prevent deleting the last admin.
    let count = admins.count_documents(None, None).await?;
    if count <= 1 {
        return Err(Error::Status(
            Status::UnprocessableEntity,
            "Cannot delete last admin!".to_string(),
        ));
    }

    let filter = doc! {
        "username": username.as_str(),
    };
    let result = admins.delete_one(filter, None).await?;
    if result.deleted_count == 0 {
        Err(Error::not_found(format!("Admin '{}'", username.0)))
    } else {
        info!("Deleted admin '{}'", username.0);
        Ok(())
    }
}

#[post("/candidates", data = "<spec>", format = "json")]
async fn create_candidate(
    _token: AuthToken,
    spec: Json<CandidateSpec>,
    new_candidates: Coll<NewCandidate>,
    candidates: Coll<Candidate>,
) -> Result<Json<CandidateDescription>> {
    let candidate: NewCandidate = spec.0.try_into()?;
    let result = new_candidates.insert_one(&candidate, None).await?;
    let id = inserted_id(&result)?;
    info!(
        "Added candidate '{}' for {}",
        candidate.name, candidate.position
    );

    let candidate = candidates
        .find_one(id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate '{id}'")))?;
    Ok(Json(candidate.into()))
}

#[delete("/candidates/<candidate_id>")]
async fn delete_candidate(
    _token: AuthToken,
    candidate_id: Id,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
) -> Result<()> {
    let received = votes
        .count_documents(doc! { "candidate_id": candidate_id }, None)
        .await?;
    if received > 0 {
        return Err(Error::Status(
            Status::Conflict,
            format!("Candidate '{candidate_id}' has already received {received} votes"),
        ));
    }

    let result = candidates.delete_one(candidate_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Candidate '{candidate_id}'")));
    }
    info!("Deleted candidate '{candidate_id}'");
    Ok(())
}

#[get("/voters")]
async fn get_voters(_token: AuthToken, voters: Coll<Voter>) -> Result<Json<Vec<VoterSummary>>> {
    let voters: Vec<Voter> = voters.find(None, None).await?.try_collect().await?;
    Ok(Json(voters.into_iter().map(Into::into).collect()))
}

#[post("/voters", data = "<registration>", format = "json")]
async fn register_voter(
    _token: AuthToken,
    registration: Json<VoterRegistration>,
    voters: Coll<NewVoter>,
) -> Result<Json<VoterSummary>> {
    let voter: NewVoter = registration.0.try_into()?;
    let already_registered = || {
        Error::Status(
            Status::Conflict,
            format!("Voter ID already registered: {}", voter.voter_id),
        )
    };

    if voters
        .find_one(doc! { "voter_id": &voter.voter_id }, None)
        .await?
        .is_some()
    {
        return Err(already_registered());
    }
    match voters.insert_one(&voter, None).await {
        Ok(_) => {}
        Err(e) if is_duplicate_key_error(&e) => return Err(already_registered()),
        Err(e) => return Err(e.into()),
    }

    info!("Registered voter '{}'", voter.voter_id);
    Ok(Json(VoterSummary {
        voter_id: voter.voter_id.clone(),
        name: voter.name.clone(),
    }))
}

#[get("/closed-positions")]
async fn get_closed_positions(
    _token: AuthToken,
    closed: Coll<ClosedPosition>,
) -> Result<Json<Vec<Position>>> {
    let mut positions = closed_positions(&closed).await?.into_iter().collect::<Vec<_>>();
    positions.sort();
    Ok(Json(positions))
}

/// Close a position. Closing it again is harmless and keeps the original time.
#[post("/closed-positions", data = "<request>", format = "json")]
async fn close_position(
    token: AuthToken,
    request: Json<ClosePositionRequest>,
    closed: Coll<ClosedPosition>,
) -> Result<()> {
    let position = &request.position;
    let update = doc! {
        "$setOnInsert": {
            "position": position,
            "closed_at": BsonDateTime::from_chrono(Utc::now()),
        }
    };
    let upsert = UpdateOptions::builder().upsert(true).build();
    let result = closed
        .update_one(doc! { "position": position }, update, upsert)
        .await?;
    if result.upserted_id.is_some() {
        info!("Admin '{}' closed voting for {position}", token.username());
    }
    Ok(())
}

#[get("/dashboard")]
async fn dashboard(
    _token: AuthToken,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    closed: Coll<ClosedPosition>,
) -> Result<Json<Vec<DashboardPosition>>> {
    let tally = current_tally(&candidates, &votes).await?;
    let closed = closed_positions(&closed).await?;
    Ok(Json(DashboardPosition::from_tally(tally, &closed)))
}
