//! Pure eligibility rules for vote casting.
//!
//! Validation is deliberately separated from the transactional insert:
//! these functions decide *whether* a cast may proceed and the insert
//! under the `(voter, office)` unique index decides *whether it already
//! has*. Only the index is authoritative against concurrent duplicates.

use crate::error::Error;
use crate::model::{
    api::vote::VoteStatus,
    common::Office,
    db::{Candidate, Voter},
};

/// Why a cast was refused before reaching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastRefusal {
    /// Guests can browse but not vote.
    GuestRole,
    /// The candidate has been retired.
    CandidateRetired,
    /// Representative ballots are restricted to the voter's own region.
    RegionMismatch,
}

impl From<CastRefusal> for Error {
    fn from(refusal: CastRefusal) -> Self {
        match refusal {
            CastRefusal::GuestRole => Error::Forbidden("guests must register to vote".to_string()),
            CastRefusal::CandidateRetired => {
                Error::Validation("candidate unavailable".to_string())
            }
            CastRefusal::RegionMismatch => Error::Validation(
                "representative votes restricted to voter's own region".to_string(),
            ),
        }
    }
}

/// Validate a cast attempt, returning the office being voted for.
///
/// Checks run in a fixed order and stop at the first refusal. The office
/// is always the candidate's own; callers never supply it.
pub fn check_cast(voter: &Voter, candidate: &Candidate) -> Result<Office, CastRefusal> {
    if !voter.role.can_cast() {
        return Err(CastRefusal::GuestRole);
    }
    if !candidate.status.is_active() {
        return Err(CastRefusal::CandidateRetired);
    }
    let office = candidate.office;
    if office.is_region_scoped() && candidate.region_id != Some(voter.region_id) {
        return Err(CastRefusal::RegionMismatch);
    }
    Ok(office)
}

/// Eligibility snapshot for an office: a voter may still cast iff they
/// hold the voter role and have not voted for that office yet.
pub fn vote_status(voter: &Voter, already_voted: bool) -> VoteStatus {
    VoteStatus {
        eligible: voter.role.can_cast() && !already_voted,
        already_voted,
    }
}
