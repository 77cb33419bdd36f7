use chrono::Utc;
use mongodb::bson::doc;
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::ballot::{BallotForm, VoteReceipt},
        common::position::Position,
        db::{
            candidate::Candidate,
            closed_position::ClosedPosition,
            vote::{NewVote, Vote},
            voter::Voter,
        },
        mongodb::{inserted_id, is_duplicate_key_error, Coll, Id},
    },
    Config,
};

use super::common::voting_status;
#[cfg(feature = "direct-vote")]
use super::common::is_closed;
#[cfg(feature = "direct-vote")]
use crate::model::common::schedule::VotingStatus;

pub fn routes() -> Vec<Route> {
    let mut routes = routes![cast_vote];
    #[cfg(feature = "direct-vote")]
    routes.extend(routes![direct_vote]);
    routes
}

const WRONG_PIN: &str = "The pin you entered is incorrect.";
const ALREADY_VOTED: &str = "You have already voted for this position.";

/// Cast one voter's ballot for `position`.
///
/// Checks run in a fixed order and the first failure wins: the form itself,
/// then the voting window, the pin, the chosen candidate, and finally whether
/// this voter has already voted for the position.
#[allow(clippy::too_many_arguments)]
#[post("/positions/<position>/votes", data = "<ballot>", format = "json")]
pub async fn cast_vote(
    position: Position,
    ballot: Json<BallotForm>,
    config: &State<Config>,
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
    closed: Coll<ClosedPosition>,
    votes: Coll<Vote>,
    new_votes: Coll<NewVote>,
) -> Result<Json<VoteReceipt>> {
    if let Err(problems) = ballot.validate() {
        return Err(Error::Status(
            Status::UnprocessableEntity,
            problems.join(" "),
        ));
    }

    let now = Utc::now();
    let status = voting_status(&position, config.schedule(), &closed, now).await?;
    if let Some(reason) = status.message() {
        warn!("Rejected ballot for {position}: {reason}");
        return Err(Error::Status(
            Status::Forbidden,
            format!("Voting is not currently open for this position. {reason}"),
        ));
    }

    let voter_id = ballot.voter_id.trim();
    let voter = voters
        .find_one(doc! { "voter_id": voter_id }, None)
        .await?
        .filter(|voter| voter.verify_pin(&ballot.pin))
        .ok_or_else(|| {
            warn!("Rejected ballot for {position}: wrong pin for voter '{voter_id}'");
            Error::Status(Status::Unauthorized, WRONG_PIN.to_string())
        })?;

    let candidate_id: Id = ballot
        .candidate
        .trim()
        .parse()
        .map_err(|_| Error::not_found(format!("Candidate '{}'", ballot.candidate)))?;
    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate '{candidate_id}'")))?;
    if candidate.position != position {
        return Err(Error::Status(
            Status::BadRequest,
            format!(
                "Candidate '{}' is not standing for {}",
                candidate.name,
                position.title()
            ),
        ));
    }

    let already_voted = doc! {
        "voter_id": &voter.voter_id,
        "position": &position,
    };
    if votes.count_documents(already_voted, None).await? > 0 {
        warn!(
            "Rejected ballot for {position}: voter '{}' already voted",
            voter.voter_id
        );
        return Err(Error::Status(Status::Conflict, ALREADY_VOTED.to_string()));
    }

    let vote = NewVote::for_voter(&voter, &candidate, now);
    let vote_id = record_ballot(&new_votes, &vote).await?;

    info!(
        "Voter '{}' voted for {} ({position})",
        voter.voter_id, candidate.name
    );
    Ok(Json(VoteReceipt::new(vote_id, &vote, &candidate)))
}

/// Insert a voter's ballot. A ballot that lost a race with a concurrent one
/// from the same voter for the same position hits the unique index and is
/// reported the same way as the pre-checked duplicate.
async fn record_ballot(new_votes: &Coll<NewVote>, vote: &NewVote) -> Result<Id> {
    match new_votes.insert_one(vote, None).await {
        Ok(result) => inserted_id(&result),
        Err(e) if is_duplicate_key_error(&e) => {
            Err(Error::Status(Status::Conflict, ALREADY_VOTED.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Record an anonymous vote straight against a candidate.
///
/// There is no voter, so nothing stops repeat votes and opening hours are not
/// enforced. Positions closed by an admin still refuse them.
#[cfg(feature = "direct-vote")]
#[post("/candidates/<candidate_id>/votes")]
pub async fn direct_vote(
    candidate_id: Id,
    candidates: Coll<Candidate>,
    closed: Coll<ClosedPosition>,
    new_votes: Coll<NewVote>,
) -> Result<Json<VoteReceipt>> {
    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate '{candidate_id}'")))?;

    if is_closed(&candidate.position, &closed).await? {
        return Err(Error::Status(
            Status::Forbidden,
            VotingStatus::Closed.message().unwrap_or_default(),
        ));
    }

    let vote = NewVote::direct(&candidate, Utc::now());
    let result = new_votes.insert_one(&vote, None).await?;
    let vote_id = inserted_id(&result)?;

    debug!("Direct vote for {} ({})", candidate.name, candidate.position);
    Ok(Json(VoteReceipt::new(vote_id, &vote, &candidate)))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::ContentType,
        local::asynchronous::{Client, LocalResponse},
        serde::json::json,
    };

    use crate::{
        error::ErrorBody,
        model::{
            api::ballot::VOTE_RECORDED,
            db::{
                candidate::{CandidateCore, NewCandidate},
                voter::{NewVoter, VoterCore},
            },
        },
    };

    use super::*;

    async fn insert_candidate(
        new_candidates: &Coll<NewCandidate>,
        candidates: &Coll<Candidate>,
        example: CandidateCore,
    ) -> Candidate {
        let result = new_candidates.insert_one(example, None).await.unwrap();
        let id = inserted_id(&result).unwrap();
        candidates.find_one(id.as_doc(), None).await.unwrap().unwrap()
    }

    async fn submit<'c>(
        client: &'c Client,
        position: Position,
        ballot: &BallotForm,
    ) -> LocalResponse<'c> {
        client
            .post(uri!(cast_vote(position)))
            .header(ContentType::JSON)
            .body(json!(ballot).to_string())
            .dispatch()
            .await
    }

    async fn error_message(response: LocalResponse<'_>) -> String {
        response.into_json::<ErrorBody>().await.unwrap().error
    }

    #[backend_test]
    async fn vote_recorded(
        client: Client,
        voters: Coll<NewVoter>,
        new_candidates: Coll<NewCandidate>,
        candidates: Coll<Candidate>,
        votes: Coll<Vote>,
    ) {
        voters.insert_one(VoterCore::example(), None).await.unwrap();
        let adaeze = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::president_example(),
        )
        .await;

        let response = submit(&client, Position::president(), &BallotForm::example(adaeze.id)).await;
        assert_eq!(Status::Ok, response.status());
        let receipt = response.into_json::<VoteReceipt>().await.unwrap();
        assert_eq!(receipt.message, VOTE_RECORDED);
        assert_eq!(receipt.candidate, adaeze.name);
        assert_eq!(receipt.position, Position::president());

        let stored = votes.find(None, None).await.unwrap();
        let stored: Vec<Vote> = rocket::futures::TryStreamExt::try_collect(stored)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id.to_string(), receipt.id);
        assert_eq!(stored[0].voter_id.as_deref(), Some("AWT-0001"));
        assert_eq!(stored[0].candidate_id, adaeze.id);
    }

    #[backend_test]
    async fn invalid_form(client: Client) {
        let ballot = BallotForm {
            name: "C".to_string(),
            pin: "12".to_string(),
            ..BallotForm::example(Id::new())
        };
        let response = submit(&client, Position::president(), &ballot).await;
        assert_eq!(Status::UnprocessableEntity, response.status());
        assert_eq!(
            error_message(response).await,
            "Name must be at least 2 characters. Pin must be at least 4 characters."
        );
    }

    #[backend_test]
    async fn wrong_pin_or_unknown_voter(
        client: Client,
        voters: Coll<NewVoter>,
        new_candidates: Coll<NewCandidate>,
        candidates: Coll<Candidate>,
    ) {
        voters.insert_one(VoterCore::example(), None).await.unwrap();
        let adaeze = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::president_example(),
        )
        .await;

        let wrong_pin = BallotForm {
            pin: "0000".to_string(),
            ..BallotForm::example(adaeze.id)
        };
        let unknown_voter = BallotForm {
            voter_id: "AWT-9999".to_string(),
            ..BallotForm::example(adaeze.id)
        };
        for ballot in [wrong_pin, unknown_voter] {
            let response = submit(&client, Position::president(), &ballot).await;
            assert_eq!(Status::Unauthorized, response.status());
            assert_eq!(error_message(response).await, WRONG_PIN);
        }
    }

    #[backend_test]
    async fn outside_voting_day(
        client: Client,
        voters: Coll<NewVoter>,
        new_candidates: Coll<NewCandidate>,
        candidates: Coll<Candidate>,
    ) {
        voters.insert_one(VoterCore::example(), None).await.unwrap();
        let halima = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::provost_marshal_example(),
        )
        .await;

        let response = submit(
            &client,
            Position::provost_marshal(),
            &BallotForm::example(halima.id),
        )
        .await;
        assert_eq!(Status::Forbidden, response.status());
        assert!(error_message(response)
            .await
            .starts_with("Voting is not currently open for this position. "));
    }

    #[backend_test]
    async fn closed_by_admin(
        client: Client,
        voters: Coll<NewVoter>,
        new_candidates: Coll<NewCandidate>,
        candidates: Coll<Candidate>,
        closed: Coll<ClosedPosition>,
    ) {
        voters.insert_one(VoterCore::example(), None).await.unwrap();
        let adaeze = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::president_example(),
        )
        .await;
        closed
            .insert_one(
                ClosedPosition {
                    position: Position::president(),
                    closed_at: Utc::now(),
                },
                None,
            )
            .await
            .unwrap();

        let response = submit(&client, Position::president(), &BallotForm::example(adaeze.id)).await;
        assert_eq!(Status::Forbidden, response.status());
        assert_eq!(
            error_message(response).await,
            "Voting is not currently open for this position. Voting for this position has been closed"
        );
    }

    #[backend_test]
    async fn unscheduled_position(client: Client) {
        let response = submit(
            &client,
            "chief-whip".parse().unwrap(),
            &BallotForm::example(Id::new()),
        )
        .await;
        assert_eq!(Status::Forbidden, response.status());
        assert_eq!(
            error_message(response).await,
            "Voting is not currently open for this position. Invalid position"
        );
    }

    #[backend_test]
    async fn one_vote_per_position(
        client: Client,
        voters: Coll<NewVoter>,
        new_candidates: Coll<NewCandidate>,
        candidates: Coll<Candidate>,
        votes: Coll<Vote>,
    ) {
        voters.insert_one(VoterCore::example(), None).await.unwrap();
        let adaeze = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::president_example(),
        )
        .await;
        let funmi = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::president_example2(),
        )
        .await;
        let ngozi = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::treasurer_example(),
        )
        .await;

        let response = submit(&client, Position::president(), &BallotForm::example(adaeze.id)).await;
        assert_eq!(Status::Ok, response.status());

        // A second president vote is refused, even for another candidate.
        for candidate in [adaeze.id, funmi.id] {
            let response =
                submit(&client, Position::president(), &BallotForm::example(candidate)).await;
            assert_eq!(Status::Conflict, response.status());
            assert_eq!(error_message(response).await, ALREADY_VOTED);
        }

        // Other positions are unaffected.
        let response = submit(&client, Position::treasurer(), &BallotForm::example(ngozi.id)).await;
        assert_eq!(Status::Ok, response.status());

        assert_eq!(votes.count_documents(None, None).await.unwrap(), 2);
    }

    #[backend_test]
    async fn candidate_for_another_position(
        client: Client,
        voters: Coll<NewVoter>,
        new_candidates: Coll<NewCandidate>,
        candidates: Coll<Candidate>,
    ) {
        voters.insert_one(VoterCore::example(), None).await.unwrap();
        let ngozi = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::treasurer_example(),
        )
        .await;

        let response = submit(&client, Position::president(), &BallotForm::example(ngozi.id)).await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test]
    async fn unknown_candidate(client: Client, voters: Coll<NewVoter>) {
        voters.insert_one(VoterCore::example(), None).await.unwrap();

        let response = submit(&client, Position::president(), &BallotForm::example(Id::new())).await;
        assert_eq!(Status::NotFound, response.status());

        let ballot = BallotForm {
            candidate: "not-an-id".to_string(),
            ..BallotForm::example(Id::new())
        };
        let response = submit(&client, Position::president(), &ballot).await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn unique_index_catches_racing_ballots(
        new_candidates: Coll<NewCandidate>,
        candidates: Coll<Candidate>,
        voters: Coll<NewVoter>,
        all_voters: Coll<Voter>,
        new_votes: Coll<NewVote>,
        votes: Coll<Vote>,
    ) {
        voters.insert_one(VoterCore::example(), None).await.unwrap();
        let voter = all_voters
            .find_one(doc! { "voter_id": "AWT-0001" }, None)
            .await
            .unwrap()
            .unwrap();
        let adaeze = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::president_example(),
        )
        .await;
        let funmi = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::president_example2(),
        )
        .await;

        let first = NewVote::for_voter(&voter, &adaeze, Utc::now());
        record_ballot(&new_votes, &first).await.unwrap();

        // Same voter and position, bypassing the pre-check.
        let second = NewVote::for_voter(&voter, &funmi, Utc::now());
        let err = new_votes.insert_one(&second, None).await.unwrap_err();
        assert!(is_duplicate_key_error(&err));

        let err = record_ballot(&new_votes, &second).await.unwrap_err();
        assert_eq!(err.status(), Status::Conflict);
        assert_eq!(err.to_string(), ALREADY_VOTED);

        // Votes without a voter are outside the index.
        for _ in 0..2 {
            new_votes
                .insert_one(NewVote::direct(&adaeze, Utc::now()), None)
                .await
                .unwrap();
        }
        assert_eq!(votes.count_documents(None, None).await.unwrap(), 3);
    }

    #[cfg(feature = "direct-vote")]
    #[backend_test]
    async fn direct_votes(
        client: Client,
        new_candidates: Coll<NewCandidate>,
        candidates: Coll<Candidate>,
        closed: Coll<ClosedPosition>,
        votes: Coll<Vote>,
    ) {
        // Provost marshal is not voted on today; direct votes ignore the timetable.
        let halima = insert_candidate(
            &new_candidates,
            &candidates,
            CandidateCore::provost_marshal_example(),
        )
        .await;
        for _ in 0..2 {
            let response = client.post(uri!(direct_vote(halima.id))).dispatch().await;
            assert_eq!(Status::Ok, response.status());
            let receipt = response.into_json::<VoteReceipt>().await.unwrap();
            assert_eq!(receipt.candidate, halima.name);
        }
        assert_eq!(votes.count_documents(None, None).await.unwrap(), 2);

        closed
            .insert_one(
                ClosedPosition {
                    position: Position::provost_marshal(),
                    closed_at: Utc::now(),
                },
                None,
            )
            .await
            .unwrap();
        let response = client.post(uri!(direct_vote(halima.id))).dispatch().await;
        assert_eq!(Status::Forbidden, response.status());

        let response = client.post(uri!(direct_vote(Id::new()))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
