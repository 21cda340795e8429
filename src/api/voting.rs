use std::collections::HashMap;

use mongodb::{bson::doc, options::FindOptions, Client};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AuthToken,
        vote::{CandidateRef, CastRequest, VoteDesc, VoteStatus},
    },
    common::{CandidateId, Office},
    db::{Candidate, Party, Region, Vote, VoteCore, Voter},
    eligibility,
    mongodb::{id_filter, is_duplicate_key_error, Coll, Counter},
};

use super::common::{party_descs, region_descs, voter_by_token};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, my_votes, can_vote]
}

#[post("/votes", data = "<request>", format = "json")]
#[allow(clippy::too_many_arguments)]
async fn cast_vote(
    token: AuthToken,
    request: Json<CastRequest>,
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
    parties: Coll<Party>,
    regions: Coll<Region>,
    votes: Coll<Vote>,
    counters: Coll<Counter>,
    db_client: &State<Client>,
) -> Result<Json<VoteDesc>> {
    let voter = voter_by_token(&token, &voters).await?;

    // Eligibility checks and the insert share one transaction. There is no
    // read-then-write duplicate check: the unique (voter, office) index is
    // the single source of truth, and the storage engine aborts the loser
    // of a racing pair.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let candidate = candidates
        .find_one_with_session(id_filter(request.candidate_id), None, &mut session)
        .await?
        .ok_or_else(|| Error::validation("candidate not found or inactive"))?;
    let office = eligibility::check_cast(&voter, &candidate)?;

    let id = Counter::next_id::<Vote>(&counters).await?;
    let vote = Vote {
        id,
        vote: VoteCore::new(voter.id, candidate.id, office),
    };
    match votes.insert_one_with_session(&vote, None, &mut session).await {
        Ok(_) => session.commit_transaction().await?,
        Err(err) if is_duplicate_key_error(&err) => {
            session.abort_transaction().await?;
            return Err(Error::conflict("already voted for this office"));
        }
        Err(err) => return Err(err.into()),
    }
    info!("Voter {} cast a vote for {office}", voter.id);

    // Denormalise the receipt.
    let party = parties
        .find_one(id_filter(candidate.party_id), None)
        .await?
        .ok_or_else(|| {
            Error::Internal(format!("Candidate {} references missing party", candidate.id))
        })?;
    let region = match candidate.region_id {
        Some(region_id) => regions
            .find_one(id_filter(region_id), None)
            .await?
            .map(Into::into),
        None => None,
    };
    let candidate = CandidateRef::new(candidate, party.into(), region);
    Ok(Json(VoteDesc::new(vote, candidate)))
}

#[get("/votes/mine")]
async fn my_votes(
    token: AuthToken,
    voters: Coll<Voter>,
    votes: Coll<Vote>,
    candidates: Coll<Candidate>,
    parties: Coll<Party>,
    regions: Coll<Region>,
) -> Result<Json<Vec<VoteDesc>>> {
    let voter = voter_by_token(&token, &voters).await?;

    let options = FindOptions::builder().sort(doc! { "cast_at": 1 }).build();
    let votes: Vec<Vote> = votes
        .find(doc! { "voter_id": voter.id }, options)
        .await?
        .try_collect()
        .await?;

    let candidate_ids: Vec<_> = votes.iter().map(|vote| vote.candidate_id).collect();
    let referenced: Vec<Candidate> = candidates
        .find(doc! { "_id": { "$in": candidate_ids } }, None)
        .await?
        .try_collect()
        .await?;
    let mut by_id: HashMap<CandidateId, Candidate> = referenced
        .into_iter()
        .map(|candidate| (candidate.id, candidate))
        .collect();
    let party_map = party_descs(&parties).await?;
    let region_map = region_descs(&regions).await?;

    let votes = votes
        .into_iter()
        .map(|vote| {
            let candidate = by_id.remove(&vote.candidate_id).ok_or_else(|| {
                Error::Internal(format!("Vote {} references missing candidate", vote.id))
            })?;
            let party = party_map.get(&candidate.party_id).cloned().ok_or_else(|| {
                Error::Internal(format!("Candidate {} references missing party", candidate.id))
            })?;
            let region = candidate
                .region_id
                .and_then(|region_id| region_map.get(&region_id).cloned());
            Ok(VoteDesc::new(vote, CandidateRef::new(candidate, party, region)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(votes))
}

#[get("/votes/can-vote/<office>")]
async fn can_vote(
    token: AuthToken,
    office: Office,
    voters: Coll<Voter>,
    votes: Coll<Vote>,
) -> Result<Json<VoteStatus>> {
    let voter = voter_by_token(&token, &voters).await?;
    let already_voted = votes
        .find_one(doc! { "voter_id": voter.id, "office": office }, None)
        .await?
        .is_some();
    Ok(Json(eligibility::vote_status(&voter, already_voted)))
}
