use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{common::secret::hash_secret, db::admin::NewAdmin};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw admin credentials, received from a user. These are never stored directly,
/// since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl TryFrom<AdminCredentials> for NewAdmin {
    type Error = Error;

    /// Convert [`AdminCredentials`] to a new admin by hashing the password.
    /// The username must be non-empty and the password long enough.
    fn try_from(cred: AdminCredentials) -> Result<Self, Self::Error> {
        if cred.username.trim().is_empty() {
            return Err(Error::Status(
                Status::UnprocessableEntity,
                "Admin username must not be empty".to_string(),
            ));
        }
        if cred.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::Status(
                Status::UnprocessableEntity,
                format!("Admin password must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }

        let password_hash = hash_secret(&cred.password)?;
        Ok(Self {
            username: cred.username,
            password_hash,
        })
    }
}

/// The admin currently signed in.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub username: String,
}
