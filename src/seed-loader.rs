//! Offline loader for the canonical seed file.
//!
//! Reads the declarative JSON seed contract and loads it idempotently:
//! running it twice against the same database creates nothing new.

use clap::{arg, command};
use log::{error, info};

use votainformado_backend::model::mongodb::{ensure_counters_exist, ensure_indexes_exist};
use votainformado_backend::seed;

async fn run(file: &str, uri: &str, database: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(file)?;
    let seed_file = seed::parse(&json)?;

    info!("Connecting to {database}...");
    let client = mongodb::Client::with_uri_str(uri).await?;
    let db = client.database(database);
    ensure_indexes_exist(&db).await?;
    ensure_counters_exist(&db).await?;

    let report = seed::load(&db, &seed_file).await?;
    info!(
        "Created {} regions, {} parties, {} candidates, {} background records ({} records skipped)",
        report.regions, report.parties, report.candidates, report.backgrounds, report.skipped
    );
    Ok(())
}

#[rocket::main]
async fn main() {
    log4rs::init_file("log4rs.yaml", log4rs_dynamic_filters::default_deserializers())
        .expect("Failed to initialise logging");

    let matches = command!()
        .about("Load the declarative seed file into the database")
        .arg(arg!(-f --file <FILE> "Path to the seed JSON file").default_value("seed/seed.json"))
        .arg(arg!(-u --uri <URI> "MongoDB connection string").default_value("mongodb://localhost:27017"))
        .arg(arg!(-d --database <NAME> "Database name").default_value("votainformado"))
        .get_matches();

    let file = matches.get_one::<String>("file").unwrap();
    let uri = matches.get_one::<String>("uri").unwrap();
    let database = matches.get_one::<String>("database").unwrap();

    if let Err(err) = run(file, uri, database).await {
        error!("Seed load failed: {err}");
        std::process::exit(1)
    }
}
