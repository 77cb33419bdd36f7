use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    api::admin::AdminCredentials,
    common::secret::verify_secret,
    mongodb::{Coll, Id},
};

/// Core admin user data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCore {
    pub username: String,
    pub password_hash: String,
}

impl AdminCore {
    /// Check whether the given password is correct.
    pub fn verify_password(&self, password: &str) -> bool {
        verify_secret(&self.password_hash, password)
    }
}

/// An admin without an ID.
pub type NewAdmin = AdminCore;

/// An admin user from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub admin: AdminCore,
}

impl Deref for Admin {
    type Target = AdminCore;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

impl DerefMut for Admin {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.admin
    }
}

/// Create an admin from `initial` if there are none, so a fresh deployment
/// can be signed in to.
pub async fn ensure_admin_exists(
    admins: &Coll<Admin>,
    new_admins: &Coll<NewAdmin>,
    initial: AdminCredentials,
) -> Result<()> {
    if admins.count_documents(None, None).await? > 0 {
        return Ok(());
    }
    let username = initial.username.clone();
    let admin = NewAdmin::try_from(initial)?;
    new_admins.insert_one(admin, None).await?;
    warn!("No admins found; created initial admin '{username}'. Change its password!");
    Ok(())
}
