use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{
    api::candidate::{display_region, PartyDesc, RegionDesc},
    common::{CandidateId, Office, PartyId},
    db::Candidate,
};

/// One row of the per-candidate results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub id: CandidateId,
    pub full_name: String,
    pub paternal_surname: String,
    pub party: PartyDesc,
    pub office: Office,
    pub region: Option<RegionDesc>,
    pub photo_url: Option<String>,
    pub vote_count: u64,
}

impl CandidateResult {
    pub fn new(
        candidate: Candidate,
        party: PartyDesc,
        region: Option<RegionDesc>,
        vote_count: u64,
    ) -> Self {
        let full_name = candidate.full_name();
        let region = display_region(candidate.office, region);
        Self {
            id: candidate.id,
            full_name,
            paternal_surname: candidate.candidate.paternal_surname,
            party,
            office: candidate.candidate.office,
            region,
            photo_url: candidate.candidate.photo_url,
            vote_count,
        }
    }
}

/// One row of the per-party results table. Parties with zero votes are
/// omitted from the listing entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyResult {
    pub id: PartyId,
    pub name: String,
    pub code: String,
    pub logo_url: Option<String>,
    pub vote_count: u64,
}

/// System-wide aggregate counts. `votes_by_office` always carries one
/// entry per office, zero or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_votes: u64,
    pub total_voters: u64,
    pub total_active_candidates: u64,
    pub votes_by_office: HashMap<Office, u64>,
}
