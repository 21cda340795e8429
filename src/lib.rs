#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod seed;

pub use config::Config;

use rocket::{Build, Rocket};

/// Construct the server, ready for launch. Configuration, the database
/// connection and the identity-registry client are attached as fairings
/// and become managed state.
pub async fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(logging::LoggerFairing)
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(config::RegistryFairing)
}

/// Connect to the database configured via `db_uri` (test bootstrap).
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let db_uri = rocket::build()
        .figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .unwrap_or_else(|_| panic!("Could not connect to database with `db_uri` \"{db_uri}\""))
}

/// Pick a random database name to avoid collisions between tests.
#[cfg(test)]
pub(crate) fn database() -> String {
    let random: u32 = rand::random();
    format!("test{random}")
}

/// Construct a server against an existing connection and database name,
/// skipping the connection fairings (test bootstrap).
#[cfg(test)]
pub(crate) async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    use model::{
        mongodb::{ensure_counters_exist, ensure_indexes_exist},
        registry::Registry,
    };

    let db = client.database(db_name);
    ensure_indexes_exist(&db).await.unwrap();
    ensure_counters_exist(&db).await.unwrap();

    let rocket = rocket::build();
    let config: Config = rocket.figment().extract().expect("Invalid config");
    let registry = Registry::new(
        config.registry_url().to_string(),
        config.registry_token().to_string(),
    );

    rocket
        .mount("/", api::routes())
        .manage(config)
        .manage(registry)
        .manage(client)
        .manage(db)
}
