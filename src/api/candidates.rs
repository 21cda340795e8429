use std::collections::HashMap;

use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::candidate::{CandidateDetail, CandidateSummary, PartyDesc, RegionDesc},
    common::{CandidateId, Office, PartyId, RegionId, Status},
    db::{Background, Candidate, Party, Region, Vote},
    mongodb::Coll,
};

use super::common::{party_descs, region_descs, regex_escape, vote_counts};

pub fn routes() -> Vec<Route> {
    routes![list_candidates, get_candidate, list_parties]
}

#[get("/candidates?<office>&<region>&<party>&<search>")]
async fn list_candidates(
    office: Option<Office>,
    region: Option<RegionId>,
    party: Option<PartyId>,
    search: Option<String>,
    candidates: Coll<Candidate>,
    parties: Coll<Party>,
    regions: Coll<Region>,
    votes: Coll<Vote>,
) -> Result<Json<Vec<CandidateSummary>>> {
    let mut filter = doc! { "status": Status::Active };
    if let Some(office) = office {
        filter.insert("office", office);
    }
    if let Some(region) = region {
        filter.insert("region_id", region);
    }
    if let Some(party) = party {
        filter.insert("party_id", party);
    }
    if let Some(search) = search.filter(|search| !search.is_empty()) {
        // Case-insensitive substring match on any of the three name parts.
        let regex = doc! { "$regex": regex_escape(&search), "$options": "i" };
        filter.insert(
            "$or",
            vec![
                doc! { "given_names": regex.clone() },
                doc! { "paternal_surname": regex.clone() },
                doc! { "maternal_surname": regex },
            ],
        );
    }

    let mut matched: Vec<Candidate> = candidates.find(filter, None).await?.try_collect().await?;

    let party_map = party_descs(&parties).await?;
    let region_map = region_descs(&regions).await?;
    let counts = vote_counts(&votes, None).await?;

    // Order by (party code, paternal surname); party codes are unique so
    // this is a total order up to surname ties.
    matched.sort_by(|a, b| {
        let a_code = party_map.get(&a.party_id).map(|party| party.code.as_str());
        let b_code = party_map.get(&b.party_id).map(|party| party.code.as_str());
        a_code
            .cmp(&b_code)
            .then_with(|| a.paternal_surname.cmp(&b.paternal_surname))
    });

    let summaries = matched
        .into_iter()
        .map(|candidate| summarise(candidate, &party_map, &region_map, &counts))
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(summaries))
}

#[get("/candidates/<id>")]
async fn get_candidate(
    id: CandidateId,
    candidates: Coll<Candidate>,
    parties: Coll<Party>,
    regions: Coll<Region>,
    backgrounds: Coll<Background>,
    votes: Coll<Vote>,
) -> Result<Json<CandidateDetail>> {
    // Retired candidates are absent from the API, not just filtered out
    // of listings.
    let candidate = candidates
        .find_one(doc! { "_id": id, "status": Status::Active }, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {id}")))?;

    let party_map = party_descs(&parties).await?;
    let region_map = region_descs(&regions).await?;
    let vote_count = votes
        .count_documents(doc! { "candidate_id": id }, None)
        .await?;

    let summary = {
        let party = party_map
            .get(&candidate.party_id)
            .cloned()
            .ok_or_else(|| {
                Error::Internal(format!("Candidate {id} references missing party"))
            })?;
        let region = candidate
            .region_id
            .and_then(|region_id| region_map.get(&region_id).cloned());
        CandidateSummary::new(candidate, party, region, vote_count)
    };

    // Newest first within each kind group.
    let options = FindOptions::builder().sort(doc! { "date": -1 }).build();
    let records: Vec<Background> = backgrounds
        .find(doc! { "candidate_id": id }, options)
        .await?
        .try_collect()
        .await?;

    Ok(Json(CandidateDetail::new(summary, records)))
}

#[get("/parties")]
async fn list_parties(parties: Coll<Party>) -> Result<Json<Vec<PartyDesc>>> {
    let options = FindOptions::builder().sort(doc! { "code": 1 }).build();
    let parties: Vec<Party> = parties
        .find(doc! { "status": Status::Active }, options)
        .await?
        .try_collect()
        .await?;
    Ok(Json(parties.into_iter().map(Into::into).collect()))
}

fn summarise(
    candidate: Candidate,
    party_map: &HashMap<PartyId, PartyDesc>,
    region_map: &HashMap<RegionId, RegionDesc>,
    counts: &HashMap<CandidateId, u64>,
) -> Result<CandidateSummary> {
    let party = party_map
        .get(&candidate.party_id)
        .cloned()
        .ok_or_else(|| {
            Error::Internal(format!(
                "Candidate {} references missing party",
                candidate.id
            ))
        })?;
    let region = candidate
        .region_id
        .and_then(|region_id| region_map.get(&region_id).cloned());
    let vote_count = counts.get(&candidate.id).copied().unwrap_or(0);
    Ok(CandidateSummary::new(candidate, party, region, vote_count))
}
