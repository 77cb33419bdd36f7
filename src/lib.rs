#[macro_use]
extern crate log;

#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

/// Assemble the server: logging, configuration, database, and every route.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(logging::LoggerFairing)
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .mount("/", api::routes())
        .register("/", error::catchers())
}

/// Connect to the database named in the test configuration.
#[cfg(test)]
async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(db_uri)
        .await
        .expect("Failed to connect to test database")
}

/// Build a server against a specific database, with an election schedule
/// that keeps the example positions open for the whole of today.
#[cfg(test)]
async fn rocket_for_db(db_client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    use model::common::schedule::ElectionSchedule;

    let figment =
        rocket::Config::figment().merge(("election", ElectionSchedule::open_today_example()));
    let db = db_client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db)
        .await
        .expect("Failed to create test indexes");

    rocket::custom(figment)
        .attach(config::ConfigFairing)
        .manage(db_client)
        .manage(db)
        .mount("/", api::routes())
        .register("/", error::catchers())
}
