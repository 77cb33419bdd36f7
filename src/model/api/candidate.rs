use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{
    common::position::Position,
    db::candidate::{Candidate, NewCandidate},
};

/// A candidate as submitted by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CandidateSpec {
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub image: Option<String>,
}

impl TryFrom<CandidateSpec> for NewCandidate {
    type Error = Error;

    fn try_from(spec: CandidateSpec) -> Result<Self, Self::Error> {
        let name = spec.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Status(
                Status::UnprocessableEntity,
                "Candidate name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            position: spec.position,
            image: spec.image.filter(|url| !url.trim().is_empty()),
        })
    }
}

/// A candidate as shown on the ballot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CandidateDescription {
    pub id: String,
    pub name: String,
    pub position: Position,
    /// Display form of `position`.
    pub title: String,
    pub image: Option<String>,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id.to_string(),
            title: candidate.position.title(),
            name: candidate.candidate.name,
            position: candidate.candidate.position,
            image: candidate.candidate.image,
        }
    }
}
