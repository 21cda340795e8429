use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::candidate::{display_region, PartyDesc, RegionDesc},
    common::{CandidateId, Office, VoteId},
    db::{Candidate, Vote},
};

/// Body of a cast request. The office is derived from the candidate
/// server-side, deliberately not supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastRequest {
    pub candidate_id: CandidateId,
}

/// The candidate a vote was cast for, as embedded in vote listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRef {
    pub id: CandidateId,
    pub full_name: String,
    pub party: PartyDesc,
    pub office: Office,
    pub region: Option<RegionDesc>,
    pub photo_url: Option<String>,
}

impl CandidateRef {
    pub fn new(candidate: Candidate, party: PartyDesc, region: Option<RegionDesc>) -> Self {
        Self {
            id: candidate.id,
            full_name: candidate.full_name(),
            party,
            office: candidate.office,
            region: display_region(candidate.office, region),
            photo_url: candidate.candidate.photo_url,
        }
    }
}

/// A committed vote as returned to its caster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDesc {
    pub id: VoteId,
    pub office: Office,
    pub candidate: CandidateRef,
    pub cast_at: DateTime<Utc>,
}

impl VoteDesc {
    pub fn new(vote: Vote, candidate: CandidateRef) -> Self {
        Self {
            id: vote.id,
            office: vote.vote.office,
            candidate,
            cast_at: vote.vote.cast_at,
        }
    }
}

/// Eligibility snapshot for one (voter, office) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteStatus {
    pub eligible: bool,
    pub already_voted: bool,
}
