use std::collections::HashMap;

use mongodb::bson::{doc, Bson};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AuthToken,
        candidate::{PartyDesc, RegionDesc},
    },
    common::{CandidateId, Office, PartyId, RegionId},
    db::{Party, Region, Vote, Voter},
    mongodb::{id_filter, Coll},
};

/// Return a Voter from the database via looking up their token ID.
pub async fn voter_by_token(token: &AuthToken, voters: &Coll<Voter>) -> Result<Voter> {
    voters
        .find_one(id_filter(token.voter_id), None)
        .await?
        .ok_or_else(|| Error::unauthorized("Token does not match a registered voter"))
}

/// Look up a voter's home region, which referential integrity guarantees
/// to exist.
pub async fn voter_region(voter: &Voter, regions: &Coll<Region>) -> Result<Region> {
    regions
        .find_one(id_filter(voter.region_id), None)
        .await?
        .ok_or_else(|| Error::Internal(format!("Voter {} references missing region", voter.id)))
}

/// All parties, keyed by id, for denormalising candidate rows.
pub async fn party_descs(parties: &Coll<Party>) -> Result<HashMap<PartyId, PartyDesc>> {
    let parties: Vec<Party> = parties.find(None, None).await?.try_collect().await?;
    Ok(parties
        .into_iter()
        .map(|party| (party.id, party.into()))
        .collect())
}

/// All regions, keyed by id, for denormalising candidate rows.
pub async fn region_descs(regions: &Coll<Region>) -> Result<HashMap<RegionId, RegionDesc>> {
    let regions: Vec<Region> = regions.find(None, None).await?.try_collect().await?;
    Ok(regions
        .into_iter()
        .map(|region| (region.id, region.into()))
        .collect())
}

/// Count votes per candidate, optionally restricted to one office.
pub async fn vote_counts(
    votes: &Coll<Vote>,
    office: Option<Office>,
) -> Result<HashMap<CandidateId, u64>> {
    let mut pipeline = Vec::new();
    if let Some(office) = office {
        pipeline.push(doc! { "$match": { "office": office } });
    }
    pipeline.push(doc! { "$group": { "_id": "$candidate_id", "total": { "$sum": 1 } } });

    let mut counts = HashMap::new();
    let mut cursor = votes.aggregate(pipeline, None).await?;
    while let Some(group) = cursor.try_next().await? {
        let candidate_id = match group.get("_id") {
            Some(Bson::Int32(id)) => *id as CandidateId,
            Some(Bson::Int64(id)) => *id as CandidateId,
            _ => continue,
        };
        let total = match group.get("total") {
            Some(Bson::Int32(total)) => *total as u64,
            Some(Bson::Int64(total)) => *total as u64,
            _ => 0,
        };
        counts.insert(candidate_id, total);
    }
    Ok(counts)
}

/// Escape a user-supplied search term for use inside a `$regex` match.
pub fn regex_escape(input: &str) -> String {
    const META: &[char] = &[
        '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
    ];
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if META.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
