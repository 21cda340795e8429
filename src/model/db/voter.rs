use std::ops::{Deref, DerefMut};

use argon2::Config as Argon2Config;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{
    api::{Dni, PersonRecord},
    common::{RegionId, Role, Status, VoterId},
};

/// Core voter data, as stored in the database. Voters are only ever
/// created by the registration flow, with their names taken from the
/// identity registry; the region is fixed at registration time.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    pub dni: Dni,
    pub given_names: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub region_id: RegionId,
    pub role: Role,
    pub status: Status,
    pub credential_hash: String,
    pub registered_at: DateTime<Utc>,
}

impl VoterCore {
    /// Build a voter from a verified person record, hashing the credential.
    pub fn new(person: PersonRecord, region_id: RegionId, credential: &str) -> Self {
        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let credential_hash =
            argon2::hash_encoded(credential.as_bytes(), &salt, &Argon2Config::default()).unwrap(); // Safe because the default `Config` is valid.
        Self {
            dni: person.dni,
            given_names: person.given_names,
            paternal_surname: person.paternal_surname,
            maternal_surname: person.maternal_surname,
            region_id,
            role: Role::Voter,
            status: Status::Active,
            credential_hash,
            registered_at: Utc::now(),
        }
    }

    /// Check whether the given credential is correct.
    pub fn verify_credential<T: AsRef<[u8]>>(&self, credential: T) -> bool {
        // Unwrap safe because voters are only created through `new`, so the
        // hash is always well-formed.
        argon2::verify_encoded(&self.credential_hash, credential.as_ref()).unwrap()
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.given_names, self.paternal_surname, self.maternal_surname
        )
    }
}

/// A voter without an id.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: VoterId,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl VoterCore {
        pub fn example(region_id: RegionId) -> Self {
            VoterCore::new(PersonRecord::example(), region_id, "secret123")
        }

        pub fn guest(region_id: RegionId) -> Self {
            let mut voter = VoterCore::new(PersonRecord::example2(), region_id, "secret123");
            voter.role = Role::Guest;
            voter
        }
    }

}
