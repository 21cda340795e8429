use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, Office, VoteId, VoterId};

/// A committed vote. The office always equals the candidate's office (it
/// is derived server-side, never supplied by the caller), and the
/// `(voter_id, office)` pair is covered by a unique index. Votes are
/// append-only: nothing in normal operation mutates or deletes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    pub voter_id: VoterId,
    pub candidate_id: CandidateId,
    pub office: Office,
    pub cast_at: DateTime<Utc>,
}

impl VoteCore {
    pub fn new(voter_id: VoterId, candidate_id: CandidateId, office: Office) -> Self {
        Self {
            voter_id,
            candidate_id,
            office,
            cast_at: Utc::now(),
        }
    }
}

/// A vote from the database, with its unique id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: VoteId,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

impl DerefMut for Vote {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.vote
    }
}
