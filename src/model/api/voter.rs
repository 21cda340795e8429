use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::{candidate::RegionDesc, Dni},
    common::{Role, VoterId},
    db::Voter,
};

/// A voter's own profile, as returned by registration, login and the
/// profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterProfile {
    pub id: VoterId,
    pub dni: Dni,
    pub given_names: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub full_name: String,
    pub region: RegionDesc,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
}

impl VoterProfile {
    pub fn new(voter: Voter, region: RegionDesc) -> Self {
        let full_name = voter.full_name();
        Self {
            id: voter.id,
            dni: voter.voter.dni,
            given_names: voter.voter.given_names,
            paternal_surname: voter.voter.paternal_surname,
            maternal_surname: voter.voter.maternal_surname,
            full_name,
            region,
            role: voter.voter.role,
            registered_at: voter.voter.registered_at,
        }
    }
}
