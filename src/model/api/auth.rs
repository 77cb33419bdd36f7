use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{
    errors::Error as JwtError, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{self, FromRequest},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::model::{db::admin::Admin, mongodb::Id};
use crate::Config;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Proof that the request comes from a signed-in admin. Taking one as a
/// handler argument makes the route admin-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "adm")]
    id: Id,
    #[serde(rename = "usr")]
    username: String,
}

/// Why a request carried no usable token.
#[derive(Debug)]
pub enum AuthError {
    Missing,
    Invalid(JwtError),
}

impl AuthToken {
    pub fn new(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
        }
    }

    /// The admin's database ID.
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Sign this token into a session cookie that expires after `auth_ttl`.
    pub fn into_cookie(self, config: &Config) -> Result<Cookie<'static>, JwtError> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;

        Ok(Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(time::Duration::seconds(config.auth_ttl().num_seconds()))
            .same_site(SameSite::Strict)
            .http_only(true)
            .finish())
    }

    /// Verify and decode a token from its cookie. Expired tokens are rejected.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self, JwtError> {
        jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config = match req.guard::<&State<Config>>().await {
            request::Outcome::Success(config) => config,
            _ => {
                error!("Admin token checked before config was loaded");
                return request::Outcome::Failure((
                    Status::InternalServerError,
                    AuthError::Missing,
                ));
            }
        };

        let cookie = match req.cookies().get(AUTH_TOKEN_COOKIE) {
            Some(cookie) => cookie,
            None => return request::Outcome::Failure((Status::Unauthorized, AuthError::Missing)),
        };

        match Self::from_cookie(cookie, config) {
            Ok(token) => request::Outcome::Success(token),
            Err(e) => {
                warn!("Rejected admin token: {e}");
                request::Outcome::Failure((Status::Unauthorized, AuthError::Invalid(e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::Figment;

    use super::*;
    use crate::model::{common::schedule::ElectionSchedule, db::admin::AdminCore};

    fn config(auth_ttl: i64) -> Config {
        Figment::new()
            .merge(("jwt_secret", "test secret"))
            .merge(("auth_ttl", auth_ttl))
            .merge(("election", ElectionSchedule::january_example()))
            .extract()
            .unwrap()
    }

    fn admin() -> Admin {
        Admin {
            id: Id::new(),
            admin: AdminCore::example(),
        }
    }

    #[test]
    fn cookie_round_trip() {
        let config = config(600);
        let admin = admin();
        let cookie = AuthToken::new(&admin).into_cookie(&config).unwrap();
        assert_eq!(cookie.name(), AUTH_TOKEN_COOKIE);

        let token = AuthToken::from_cookie(&cookie, &config).unwrap();
        assert_eq!(token.id(), admin.id);
        assert_eq!(token.username(), admin.username);
    }

    #[test]
    fn wrong_secret_rejected() {
        let cookie = AuthToken::new(&admin()).into_cookie(&config(600)).unwrap();
        let other: Config = Figment::new()
            .merge(("jwt_secret", "another secret"))
            .merge(("auth_ttl", 600))
            .merge(("election", ElectionSchedule::january_example()))
            .extract()
            .unwrap();
        assert!(AuthToken::from_cookie(&cookie, &other).is_err());
    }

    #[test]
    fn garbage_rejected() {
        let cookie = Cookie::new(AUTH_TOKEN_COOKIE, "not.a.jwt");
        assert!(AuthToken::from_cookie(&cookie, &config(600)).is_err());
    }
}
