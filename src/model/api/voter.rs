use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{
    api::ballot::MIN_PIN_LENGTH,
    common::secret::hash_secret,
    db::voter::{NewVoter, Voter},
};

/// A voter as registered by an admin. The pin is hashed before storage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VoterRegistration {
    pub voter_id: String,
    pub pin: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl TryFrom<VoterRegistration> for NewVoter {
    type Error = Error;

    fn try_from(registration: VoterRegistration) -> Result<Self, Self::Error> {
        let voter_id = registration.voter_id.trim().to_string();
        if voter_id.is_empty() {
            return Err(Error::Status(
                Status::UnprocessableEntity,
                "Voter ID is required.".to_string(),
            ));
        }
        if registration.pin.chars().count() < MIN_PIN_LENGTH {
            return Err(Error::Status(
                Status::UnprocessableEntity,
                "Pin must be at least 4 characters.".to_string(),
            ));
        }
        Ok(Self {
            voter_id,
            name: registration.name.filter(|name| !name.trim().is_empty()),
            pin_hash: hash_secret(&registration.pin)?,
        })
    }
}

/// A registered voter, without their pin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VoterSummary {
    pub voter_id: String,
    pub name: Option<String>,
}

impl From<Voter> for VoterSummary {
    fn from(voter: Voter) -> Self {
        Self {
            voter_id: voter.voter.voter_id,
            name: voter.voter.name,
        }
    }
}

/// A pin to check against a voter's record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PinCheck {
    pub voter_id: String,
    pub pin: String,
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PinVerdict {
    pub valid: bool,
}
