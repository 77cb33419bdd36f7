use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Catcher, Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    /// A 404 for the described resource, e.g. `Error::not_found("Candidate 'x'")`.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Status(Status::NotFound, format!("{} not found", what.into()))
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Jwt(_) | Self::Argon2(_) => Status::InternalServerError,
            Self::Status(status, _) => *status,
        }
    }
}

/// JSON body returned alongside every error status.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        let message = match self {
            Self::Status(_, message) => message,
            internal => {
                error!("Internal error: {internal}");
                "Internal server error".to_string()
            }
        };
        (status, Json(ErrorBody { error: message })).respond_to(req)
    }
}

/// Error bodies for failures Rocket raises itself: rejected guards, unparsable
/// request bodies, and unmatched routes.
#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> (Status, Json<ErrorBody>) {
    let error = status.reason().unwrap_or("Unknown error").to_string();
    (status, Json(ErrorBody { error }))
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::ContentType,
        local::asynchronous::{Client, LocalResponse},
    };

    use super::*;

    async fn error_body(response: LocalResponse<'_>) -> ErrorBody {
        response.into_json::<ErrorBody>().await.unwrap()
    }

    #[backend_test]
    async fn signed_out_admin_routes_give_json_errors(client: Client) {
        for path in ["/auth/admin", "/dashboard", "/voters"] {
            let response = client.get(path).dispatch().await;
            assert_eq!(Status::Unauthorized, response.status());
            assert_eq!(error_body(response).await.error, "Unauthorized");
        }
    }

    #[backend_test]
    async fn malformed_body_gives_json_error(client: Client) {
        let response = client
            .post("/voters/verify")
            .header(ContentType::JSON)
            .body(r#"{"voter_id": "AWT-0001"}"#)
            .dispatch()
            .await;
        assert_eq!(Status::UnprocessableEntity, response.status());
        assert_eq!(error_body(response).await.error, "Unprocessable Entity");
    }

    #[backend_test]
    async fn unmatched_route_gives_json_error(client: Client) {
        for path in ["/positions/Not%20A%20Slug", "/no-such-page"] {
            let response = client.get(path).dispatch().await;
            assert_eq!(Status::NotFound, response.status());
            assert_eq!(error_body(response).await.error, "Not Found");
        }
    }

    #[test]
    fn not_found_message() {
        let err = Error::not_found("Candidate 'abc'");
        assert_eq!(err.status(), Status::NotFound);
        assert_eq!(err.to_string(), "Candidate 'abc' not found");
    }

    #[test]
    fn status_passthrough() {
        let err = Error::Status(Status::Conflict, "taken".to_string());
        assert_eq!(err.status(), Status::Conflict);
        assert_eq!(err.to_string(), "taken");
    }
}
