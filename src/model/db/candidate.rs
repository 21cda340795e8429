use std::ops::{Deref, DerefMut};

use mongodb::Database;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{CandidateId, Office, PartyId, RegionId, Status},
    mongodb::{id_filter, is_duplicate_key_error, Coll, Counter},
};

use super::{Party, Region};

/// Core candidate data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub given_names: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub party_id: PartyId,
    pub office: Office,
    /// Required for Representative candidacies; absent means the candidate
    /// runs nationally.
    pub region_id: Option<RegionId>,
    pub photo_url: Option<String>,
    pub status: Status,
}

impl CandidateCore {
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.given_names, self.paternal_surname, self.maternal_surname
        )
    }

    /// Business rules checked before any candidate reaches storage.
    pub fn validate(&self) -> Result<()> {
        if self.office.is_region_scoped() && self.region_id.is_none() {
            return Err(Error::validation(
                "Representative candidates require an assigned region",
            ));
        }
        Ok(())
    }
}

/// A candidate without an id.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Candidate {
    /// Validate and insert a new candidate under a freshly allocated id.
    ///
    /// The party must exist, the region (when given) must exist, and the
    /// identity tuple (name, office, region) must be unused; the unique
    /// index has the final say on the latter and surfaces as `Conflict`.
    pub async fn create(db: &Database, candidate: NewCandidate) -> Result<Candidate> {
        candidate.validate()?;

        let party = Coll::<Party>::from_db(db)
            .find_one(id_filter(candidate.party_id), None)
            .await?;
        if party.is_none() {
            return Err(Error::validation(format!(
                "Party {} does not exist",
                candidate.party_id
            )));
        }
        if let Some(region_id) = candidate.region_id {
            let region = Coll::<Region>::from_db(db)
                .find_one(id_filter(region_id), None)
                .await?;
            if region.is_none() {
                return Err(Error::validation(format!(
                    "Region {region_id} does not exist"
                )));
            }
        }

        let id = Counter::next_id::<Candidate>(&Coll::from_db(db)).await?;
        let candidate = Candidate { id, candidate };
        match Coll::<Candidate>::from_db(db)
            .insert_one(&candidate, None)
            .await
        {
            Ok(_) => Ok(candidate),
            Err(err) if is_duplicate_key_error(&err) => Err(Error::conflict(format!(
                "{} already stands for this office and region",
                candidate.full_name()
            ))),
            Err(err) => Err(err.into()),
        }
    }
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateCore {
        pub fn representative(party_id: PartyId, region_id: RegionId) -> Self {
            Self {
                given_names: "María Elena".to_string(),
                paternal_surname: "Quispe".to_string(),
                maternal_surname: "Huamán".to_string(),
                party_id,
                office: Office::Representative,
                region_id: Some(region_id),
                photo_url: None,
                status: Status::Active,
            }
        }

        pub fn representative2(party_id: PartyId, region_id: RegionId) -> Self {
            Self {
                given_names: "Carlos Alberto".to_string(),
                paternal_surname: "Mendoza".to_string(),
                maternal_surname: "Flores".to_string(),
                party_id,
                office: Office::Representative,
                region_id: Some(region_id),
                photo_url: None,
                status: Status::Active,
            }
        }

        pub fn president(party_id: PartyId) -> Self {
            Self {
                given_names: "Jorge Luis".to_string(),
                paternal_surname: "Salazar".to_string(),
                maternal_surname: "Paredes".to_string(),
                party_id,
                office: Office::President,
                region_id: None,
                photo_url: None,
                status: Status::Active,
            }
        }

        pub fn senator(party_id: PartyId) -> Self {
            Self {
                given_names: "Ana Cecilia".to_string(),
                paternal_surname: "Torres".to_string(),
                maternal_surname: "Ríos".to_string(),
                party_id,
                office: Office::Senator,
                region_id: None,
                photo_url: None,
                status: Status::Active,
            }
        }
    }
}
