use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{BackgroundId, BackgroundKind, CandidateId, Office, PartyId, RegionId},
    db::{Background, Candidate, Party, Region},
};

/// API description of a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyDesc {
    pub id: PartyId,
    pub name: String,
    pub code: String,
    pub logo_url: Option<String>,
}

impl From<Party> for PartyDesc {
    fn from(party: Party) -> Self {
        Self {
            id: party.id,
            name: party.party.name,
            code: party.party.code,
            logo_url: party.party.logo_url,
        }
    }
}

/// API description of a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDesc {
    pub id: RegionId,
    pub name: String,
}

impl RegionDesc {
    /// The display-only placeholder shown for national candidacies. Never
    /// stored; clients rely on every non-Representative candidate carrying
    /// some region.
    pub fn national() -> Self {
        Self {
            id: 0,
            name: "National".to_string(),
        }
    }
}

impl From<Region> for RegionDesc {
    fn from(region: Region) -> Self {
        Self {
            id: region.id,
            name: region.region.name,
        }
    }
}

/// The region to display for a candidate: their own when they have one,
/// the national placeholder for offices that run nationally, and nothing
/// otherwise.
pub fn display_region(office: Office, region: Option<RegionDesc>) -> Option<RegionDesc> {
    region.or_else(|| (!office.is_region_scoped()).then(RegionDesc::national))
}

/// One row of a candidate listing, with its computed vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: CandidateId,
    pub given_names: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub full_name: String,
    pub party: PartyDesc,
    pub office: Office,
    pub region: Option<RegionDesc>,
    pub photo_url: Option<String>,
    pub vote_count: u64,
}

impl CandidateSummary {
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
            given_names: candidate.candidate.given_names,
            paternal_surname: candidate.candidate.paternal_surname,
            maternal_surname: candidate.candidate.maternal_surname,
            full_name,
            party,
            office: candidate.candidate.office,
            region,
            photo_url: candidate.candidate.photo_url,
            vote_count,
        }
    }
}

/// A background record as displayed on a candidate's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundDesc {
    pub id: BackgroundId,
    pub kind: BackgroundKind,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub source_url: Option<String>,
}

impl From<Background> for BackgroundDesc {
    fn from(background: Background) -> Self {
        Self {
            id: background.id,
            kind: background.background.kind,
            title: background.background.title,
            description: background.background.description,
            date: background.background.date,
            source_url: background.background.source_url,
        }
    }
}

/// Candidate detail: the listing row plus background records grouped by
/// kind, each group newest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDetail {
    #[serde(flatten)]
    pub summary: CandidateSummary,
    pub complaints: Vec<BackgroundDesc>,
    pub projects: Vec<BackgroundDesc>,
    pub proposals: Vec<BackgroundDesc>,
}

impl CandidateDetail {
    /// Group the given records (already ordered by date descending) under
    /// the summary.
    pub fn new(summary: CandidateSummary, records: Vec<Background>) -> Self {
        let mut complaints = Vec::new();
        let mut projects = Vec::new();
        let mut proposals = Vec::new();
        for record in records {
            let group = match record.kind {
                BackgroundKind::Complaint => &mut complaints,
                BackgroundKind::Project => &mut projects,
                BackgroundKind::Proposal => &mut proposals,
            };
            group.push(record.into());
        }
        Self {
            summary,
            complaints,
            projects,
            proposals,
        }
    }
}
