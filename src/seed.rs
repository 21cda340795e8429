//! Declarative seed data loading.
//!
//! One canonical JSON file describes the reference data (regions, parties,
//! candidates and their background records) and one idempotent loader
//! consumes it: existing rows are matched by natural key and left alone,
//! and a record that fails validation is logged and skipped without
//! aborting the rest. That leniency is acceptable for offline loading
//! only; nothing on the request path ever skips an error.

use std::collections::HashMap;

use chrono::NaiveDate;
use mongodb::{bson::doc, Database};
use rocket::serde::json::serde_json;
use serde::Deserialize;

use crate::error::Result;
use crate::model::{
    common::{BackgroundKind, Office, PartyId, RegionId, Status},
    db::{
        Background, BackgroundCore, Candidate, CandidateCore, Party, PartyCore, Region, RegionCore,
    },
    mongodb::Coll,
};

/// The canonical seed contract.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub parties: Vec<SeedParty>,
    #[serde(default)]
    pub candidates: Vec<SeedCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedParty {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCandidate {
    pub given_names: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    /// Party short code.
    pub party: String,
    pub office: Office,
    /// Region name; required for Representative candidacies.
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub backgrounds: Vec<SeedBackground>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedBackground {
    pub kind: BackgroundKind,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Counts of rows actually created by a load run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub regions: usize,
    pub parties: usize,
    pub candidates: usize,
    pub backgrounds: usize,
    pub skipped: usize,
}

/// Parse a seed file from its JSON form.
pub fn parse(json: &str) -> serde_json::Result<SeedFile> {
    serde_json::from_str(json)
}

/// Load the seed data, creating whatever does not exist yet.
pub async fn load(db: &Database, seed: &SeedFile) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    // Regions, by name.
    let mut region_ids: HashMap<String, RegionId> = HashMap::new();
    for name in &seed.regions {
        let existing = Coll::<Region>::from_db(db)
            .find_one(doc! { "name": name }, None)
            .await?;
        let region = match existing {
            Some(region) => region,
            None => {
                report.regions += 1;
                Region::insert(db, RegionCore { name: name.clone() }).await?
            }
        };
        region_ids.insert(name.clone(), region.id);
    }

    // Parties, by code.
    let mut party_ids: HashMap<String, PartyId> = HashMap::new();
    for party in &seed.parties {
        let existing = Coll::<Party>::from_db(db)
            .find_one(doc! { "code": &party.code }, None)
            .await?;
        let created = match existing {
            Some(party) => party,
            None => {
                report.parties += 1;
                Party::insert(
                    db,
                    PartyCore {
                        name: party.name.clone(),
                        code: party.code.clone(),
                        logo_url: party.logo_url.clone(),
                        status: Status::Active,
                    },
                )
                .await?
            }
        };
        party_ids.insert(party.code.clone(), created.id);
    }

    // Candidates, by identity tuple. A candidate that fails validation is
    // skipped, not fatal.
    for candidate in &seed.candidates {
        match load_candidate(db, candidate, &region_ids, &party_ids).await {
            Ok(Some((id, created))) => {
                if created {
                    report.candidates += 1;
                }
                for background in &candidate.backgrounds {
                    if load_background(db, id, background).await? {
                        report.backgrounds += 1;
                    }
                }
            }
            Ok(None) => report.skipped += 1,
            Err(err) => return Err(err),
        }
    }

    info!(
        "Seed load complete: {} regions, {} parties, {} candidates, {} backgrounds created, {} records skipped",
        report.regions, report.parties, report.candidates, report.backgrounds, report.skipped
    );
    Ok(report)
}

/// Get or create a single candidate. Returns its id and whether it was
/// created, or `None` if the record was skipped.
async fn load_candidate(
    db: &Database,
    candidate: &SeedCandidate,
    region_ids: &HashMap<String, RegionId>,
    party_ids: &HashMap<String, PartyId>,
) -> Result<Option<(u32, bool)>> {
    let party_id = match party_ids.get(&candidate.party) {
        Some(id) => *id,
        None => {
            warn!(
                "Skipping candidate {} {}: unknown party code {}",
                candidate.given_names, candidate.paternal_surname, candidate.party
            );
            return Ok(None);
        }
    };
    let region_id = match &candidate.region {
        Some(name) => match region_ids.get(name) {
            Some(id) => Some(*id),
            None => {
                warn!(
                    "Skipping candidate {} {}: unknown region {name}",
                    candidate.given_names, candidate.paternal_surname
                );
                return Ok(None);
            }
        },
        None => None,
    };

    let tuple_filter = doc! {
        "given_names": &candidate.given_names,
        "paternal_surname": &candidate.paternal_surname,
        "maternal_surname": &candidate.maternal_surname,
        "office": candidate.office,
        "region_id": region_id,
    };
    if let Some(existing) = Coll::<Candidate>::from_db(db)
        .find_one(tuple_filter, None)
        .await?
    {
        return Ok(Some((existing.id, false)));
    }

    let core = CandidateCore {
        given_names: candidate.given_names.clone(),
        paternal_surname: candidate.paternal_surname.clone(),
        maternal_surname: candidate.maternal_surname.clone(),
        party_id,
        office: candidate.office,
        region_id,
        photo_url: candidate.photo_url.clone(),
        status: Status::Active,
    };
    match Candidate::create(db, core).await {
        Ok(created) => Ok(Some((created.id, true))),
        Err(crate::error::Error::Validation(msg)) | Err(crate::error::Error::Conflict(msg)) => {
            warn!(
                "Skipping candidate {} {}: {msg}",
                candidate.given_names, candidate.paternal_surname
            );
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Get or create a single background record; returns whether it was created.
async fn load_background(
    db: &Database,
    candidate_id: u32,
    background: &SeedBackground,
) -> Result<bool> {
    let filter = doc! {
        "candidate_id": candidate_id,
        "title": &background.title,
        "date": background.date.to_string(),
    };
    let existing = Coll::<Background>::from_db(db).find_one(filter, None).await?;
    if existing.is_some() {
        return Ok(false);
    }

    Background::insert(
        db,
        BackgroundCore {
            candidate_id,
            kind: background.kind,
            title: background.title.clone(),
            description: background.description.clone(),
            date: background.date,
            source_url: background.source_url.clone(),
        },
    )
    .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use mongodb::Database;

    use super::*;

    fn sample() -> SeedFile {
        parse(
            r#"{
                "regions": ["Lima", "Cusco"],
                "parties": [
                    { "name": "Partido Morado", "code": "PM" },
                    { "name": "Fuerza Popular", "code": "FP" }
                ],
                "candidates": [
                    {
                        "given_names": "María Elena",
                        "paternal_surname": "Quispe",
                        "maternal_surname": "Huamán",
                        "party": "PM",
                        "office": "representative",
                        "region": "Lima",
                        "backgrounds": [
                            {
                                "kind": "proposal",
                                "title": "Rural connectivity plan",
                                "description": "Broadband for every district capital.",
                                "date": "2024-02-01"
                            }
                        ]
                    },
                    {
                        "given_names": "Jorge Luis",
                        "paternal_surname": "Salazar",
                        "maternal_surname": "Paredes",
                        "party": "PM",
                        "office": "president"
                    },
                    {
                        "given_names": "Rosa",
                        "paternal_surname": "Inválida",
                        "maternal_surname": "Sin Región",
                        "party": "FP",
                        "office": "representative"
                    },
                    {
                        "given_names": "Luis",
                        "paternal_surname": "Sin",
                        "maternal_surname": "Partido",
                        "party": "XX",
                        "office": "senator"
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[backend_test]
    async fn load_is_lenient_and_idempotent(db: Database) {
        let seed = sample();

        // First load creates everything valid and skips the two bad rows
        // (Representative without region, unknown party code).
        let report = load(&db, &seed).await.unwrap();
        assert_eq!(report.regions, 2);
        assert_eq!(report.parties, 2);
        assert_eq!(report.candidates, 2);
        assert_eq!(report.backgrounds, 1);
        assert_eq!(report.skipped, 2);

        // Second load finds everything in place and creates nothing.
        let report = load(&db, &seed).await.unwrap();
        assert_eq!(report.regions, 0);
        assert_eq!(report.parties, 0);
        assert_eq!(report.candidates, 0);
        assert_eq!(report.backgrounds, 0);
        assert_eq!(report.skipped, 2);

        // Row counts confirm no duplicates.
        let candidates = Coll::<Candidate>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(candidates, 2);
        let backgrounds = Coll::<Background>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(backgrounds, 1);
    }

    #[test]
    fn malformed_seed_fails_to_parse() {
        assert!(parse("{ not json").is_err());
        assert!(parse(r#"{ "candidates": [{ "office": "emperor" }] }"#).is_err());
    }
}
