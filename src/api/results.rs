use std::collections::HashMap;

use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::results::{CandidateResult, PartyResult, Statistics},
    common::{Office, PartyId, Role, Status},
    db::{Candidate, Party, Region, Vote, Voter},
    mongodb::Coll,
};

use super::common::{party_descs, region_descs, vote_counts};

pub fn routes() -> Vec<Route> {
    routes![results_by_candidate, results_by_party, statistics]
}

#[get("/results?<office>&<region>")]
async fn results_by_candidate(
    office: Option<Office>,
    region: Option<u32>,
    candidates: Coll<Candidate>,
    parties: Coll<Party>,
    regions: Coll<Region>,
    votes: Coll<Vote>,
) -> Result<Json<Vec<CandidateResult>>> {
    let mut filter = doc! { "status": Status::Active };
    if let Some(office) = office {
        filter.insert("office", office);
    }
    if let Some(region) = region {
        filter.insert("region_id", region);
    }

    let matched: Vec<Candidate> = candidates.find(filter, None).await?.try_collect().await?;
    let party_map = party_descs(&parties).await?;
    let region_map = region_descs(&regions).await?;
    let counts = vote_counts(&votes, office).await?;

    let mut results = matched
        .into_iter()
        .map(|candidate| {
            let party = party_map.get(&candidate.party_id).cloned().ok_or_else(|| {
                Error::Internal(format!(
                    "Candidate {} references missing party",
                    candidate.id
                ))
            })?;
            let region = candidate
                .region_id
                .and_then(|region_id| region_map.get(&region_id).cloned());
            let vote_count = counts.get(&candidate.id).copied().unwrap_or(0);
            Ok(CandidateResult::new(candidate, party, region, vote_count))
        })
        .collect::<Result<Vec<_>>>()?;

    // Highest count first; ties broken by paternal surname.
    results.sort_by(|a, b| {
        b.vote_count
            .cmp(&a.vote_count)
            .then_with(|| a.paternal_surname.cmp(&b.paternal_surname))
    });

    Ok(Json(results))
}

#[get("/results/by-party?<office>")]
async fn results_by_party(
    office: Option<Office>,
    candidates: Coll<Candidate>,
    parties: Coll<Party>,
    votes: Coll<Vote>,
) -> Result<Json<Vec<PartyResult>>> {
    let mut filter = doc! { "status": Status::Active };
    if let Some(office) = office {
        filter.insert("office", office);
    }
    let matched: Vec<Candidate> = candidates.find(filter, None).await?.try_collect().await?;
    let counts = vote_counts(&votes, office).await?;

    // Sum each active party's active candidates.
    let mut by_party: HashMap<PartyId, u64> = HashMap::new();
    for candidate in &matched {
        let votes_for = counts.get(&candidate.id).copied().unwrap_or(0);
        *by_party.entry(candidate.party_id).or_default() += votes_for;
    }

    let parties: Vec<Party> = parties
        .find(doc! { "status": Status::Active }, None)
        .await?
        .try_collect()
        .await?;
    let mut results: Vec<PartyResult> = parties
        .into_iter()
        .filter_map(|party| {
            let vote_count = by_party.get(&party.id).copied().unwrap_or(0);
            // Parties without votes are omitted entirely.
            (vote_count > 0).then(|| PartyResult {
                id: party.id,
                name: party.party.name,
                code: party.party.code,
                logo_url: party.party.logo_url,
                vote_count,
            })
        })
        .collect();

    results.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));

    Ok(Json(results))
}

#[get("/stats")]
async fn statistics(
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
) -> Result<Json<Statistics>> {
    let total_votes = votes.count_documents(None, None).await?;
    let total_voters = voters
        .count_documents(doc! { "role": Role::Voter }, None)
        .await?;
    let total_active_candidates = candidates
        .count_documents(doc! { "status": Status::Active }, None)
        .await?;

    // One entry per office, zero or not.
    let mut votes_by_office = HashMap::new();
    for office in Office::ALL {
        let count = votes.count_documents(doc! { "office": office }, None).await?;
        votes_by_office.insert(office, count);
    }

    Ok(Json(Statistics {
        total_votes,
        total_voters,
        total_active_candidates,
        votes_by_office,
    }))
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Status as HttpStatus},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::api::auth::tests::{bearer, register_voter};
    use crate::model::{
        api::{auth::RegisterRequest, Dni},
        db::{CandidateCore, PartyCore, RegionCore, VoterCore},
        mongodb::Counter,
    };

    use super::*;

    struct Scenario {
        lima: Region,
        rep_a: Candidate,
        rep_b: Candidate,
        president: Candidate,
    }

    /// One region, two parties, two Lima representatives (A of PM, B of
    /// FP), one PM president. Three voters: two cast for A, one for B; one
    /// also casts for the president.
    async fn seed_scenario(client: &Client, db: &Database) -> Scenario {
        let lima = Region::insert(db, RegionCore::lima()).await.unwrap();
        let pm = Party::insert(db, PartyCore::example1()).await.unwrap();
        let fp = Party::insert(db, PartyCore::example2()).await.unwrap();
        let rep_a = Candidate::create(db, CandidateCore::representative(pm.id, lima.id))
            .await
            .unwrap();
        let rep_b = Candidate::create(db, CandidateCore::representative2(fp.id, lima.id))
            .await
            .unwrap();
        let president = Candidate::create(db, CandidateCore::president(pm.id))
            .await
            .unwrap();

        let dnis = ["11111111", "22222222", "33333333"];
        let mut tokens = Vec::new();
        for dni in dnis {
            let mut request = RegisterRequest::example(lima.id);
            request.dni = dni.to_string();
            let auth = register_voter(client, &request).await;
            tokens.push(auth.tokens.access);
        }

        cast(client, &tokens[0], rep_a.id).await;
        cast(client, &tokens[1], rep_a.id).await;
        cast(client, &tokens[2], rep_b.id).await;
        cast(client, &tokens[0], president.id).await;

        Scenario {
            lima,
            rep_a,
            rep_b,
            president,
        }
    }

    async fn cast(client: &Client, access: &str, candidate_id: u32) {
        let response = client
            .post("/votes")
            .header(ContentType::JSON)
            .header(bearer(access))
            .body(serde_json::json!({ "candidate_id": candidate_id }).to_string())
            .dispatch()
            .await;
        assert_eq!(HttpStatus::Ok, response.status());
    }

    async fn fetch_results(client: &Client, query: &str) -> Vec<CandidateResult> {
        let response = client.get(format!("/results{query}")).dispatch().await;
        assert_eq!(HttpStatus::Ok, response.status());
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    async fn fetch_party_results(client: &Client, query: &str) -> Vec<PartyResult> {
        let response = client
            .get(format!("/results/by-party{query}"))
            .dispatch()
            .await;
        assert_eq!(HttpStatus::Ok, response.status());
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    #[backend_test]
    async fn candidate_results_count_and_order(client: Client, db: Database) {
        let scenario = seed_scenario(&client, &db).await;

        let results = fetch_results(&client, "?office=representative").await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, scenario.rep_a.id);
        assert_eq!(results[0].vote_count, 2);
        assert_eq!(results[1].id, scenario.rep_b.id);
        assert_eq!(results[1].vote_count, 1);

        // Region-scoped query returns the same two candidates.
        let results = fetch_results(
            &client,
            &format!("?office=representative&region={}", scenario.lima.id),
        )
        .await;
        assert_eq!(results.len(), 2);

        // President results carry only presidential votes.
        let results = fetch_results(&client, "?office=president").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, scenario.president.id);
        assert_eq!(results[0].vote_count, 1);
    }

    #[backend_test]
    async fn ties_break_by_paternal_surname(client: Client, db: Database) {
        let lima = Region::insert(&db, RegionCore::lima()).await.unwrap();
        let pm = Party::insert(&db, PartyCore::example1()).await.unwrap();
        let fp = Party::insert(&db, PartyCore::example2()).await.unwrap();
        // Mendoza and Quispe, both with zero votes.
        let quispe = Candidate::create(&db, CandidateCore::representative(pm.id, lima.id))
            .await
            .unwrap();
        let mendoza = Candidate::create(&db, CandidateCore::representative2(fp.id, lima.id))
            .await
            .unwrap();

        let results = fetch_results(&client, "").await;
        let ids: Vec<_> = results.iter().map(|result| result.id).collect();
        assert_eq!(ids, vec![mendoza.id, quispe.id]);
    }

    #[backend_test]
    async fn party_totals_cross_check_candidate_totals(client: Client, db: Database) {
        seed_scenario(&client, &db).await;

        for query in ["", "?office=representative", "?office=president"] {
            let by_candidate = fetch_results(&client, query).await;
            let by_party = fetch_party_results(&client, query).await;

            // Summing candidate counts per party must reproduce the party
            // totals exactly.
            let mut expected: HashMap<u32, u64> = HashMap::new();
            for result in &by_candidate {
                *expected.entry(result.party.id).or_default() += result.vote_count;
            }
            expected.retain(|_, count| *count > 0);

            let actual: HashMap<u32, u64> = by_party
                .iter()
                .map(|result| (result.id, result.vote_count))
                .collect();
            assert_eq!(expected, actual);

            // Ordered by descending count, zero-vote parties absent.
            assert!(by_party.windows(2).all(|w| w[0].vote_count >= w[1].vote_count));
            assert!(by_party.iter().all(|result| result.vote_count > 0));
        }
    }

    #[backend_test]
    async fn statistics_cover_every_office(client: Client, db: Database) {
        // Empty system: all zeroes, but every office is present.
        let response = client.get(uri!(statistics)).dispatch().await;
        assert_eq!(HttpStatus::Ok, response.status());
        let stats: Statistics =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(stats.total_votes, 0);
        assert_eq!(stats.votes_by_office.len(), Office::ALL.len());
        assert!(stats.votes_by_office.values().all(|count| *count == 0));

        let scenario = seed_scenario(&client, &db).await;

        // A guest does not count as a voter.
        let counters = Coll::<Counter>::from_db(&db);
        let id = Counter::next_id::<Voter>(&counters).await.unwrap();
        let guest = Voter {
            id,
            voter: {
                let mut core = VoterCore::example(scenario.lima.id);
                core.dni = Dni::unknown();
                core.role = Role::Guest;
                core
            },
        };
        Coll::<Voter>::from_db(&db)
            .insert_one(&guest, None)
            .await
            .unwrap();

        let response = client.get(uri!(statistics)).dispatch().await;
        assert_eq!(HttpStatus::Ok, response.status());
        let stats: Statistics =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(stats.total_votes, 4);
        assert_eq!(stats.total_voters, 3);
        assert_eq!(stats.total_active_candidates, 3);
        assert_eq!(stats.votes_by_office[&Office::Representative], 3);
        assert_eq!(stats.votes_by_office[&Office::President], 1);
        assert_eq!(stats.votes_by_office[&Office::Senator], 0);
    }
}
