use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            admin::{AdminCredentials, AdminSession},
            auth::{AuthToken, AUTH_TOKEN_COOKIE},
        },
        db::admin::Admin,
        mongodb::Coll,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![authenticate, session, logout]
}

#[post("/auth/admin", data = "<credentials>", format = "json")]
pub async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    config: &State<Config>,
) -> Result<Json<AdminSession>> {
    let with_username = doc! {
        "username": &credentials.username
    };

    let admin = admins
        .find_one(with_username, None)
        .await?
        .filter(|admin| admin.verify_password(&credentials.password))
        .ok_or_else(|| {
            warn!("Failed sign-in attempt for '{}'", credentials.username);
            Error::Status(Status::Unauthorized, "Invalid login credentials".to_string())
        })?;

    cookies.add(AuthToken::new(&admin).into_cookie(config)?);
    info!("Admin '{}' signed in", admin.username);

    Ok(Json(AdminSession {
        username: admin.admin.username,
    }))
}

/// Who is signed in. Also confirms the admin account still exists.
#[get("/auth/admin")]
pub async fn session(token: AuthToken, admins: Coll<Admin>) -> Result<Json<AdminSession>> {
    let admin = admins
        .find_one(token.id().as_doc(), None)
        .await?
        .ok_or_else(|| {
            Error::Status(
                Status::Unauthorized,
                format!("Admin '{}' no longer exists", token.username()),
            )
        })?;
    Ok(Json(AdminSession {
        username: admin.admin.username,
    }))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}
