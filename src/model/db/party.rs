use std::ops::{Deref, DerefMut};

use mongodb::{bson::doc, Client, Database};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{PartyId, Status},
    mongodb::{id_filter, Coll, Counter},
};

use super::{Background, Candidate, Vote};

/// Core political party data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyCore {
    pub name: String,
    /// Short code, unique across parties.
    pub code: String,
    pub logo_url: Option<String>,
    pub status: Status,
}

/// A party without an id.
pub type NewParty = PartyCore;

/// A party from the database, with its unique id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    #[serde(rename = "_id")]
    pub id: PartyId,
    #[serde(flatten)]
    pub party: PartyCore,
}

impl Party {
    /// Insert a new party under a freshly allocated id.
    pub async fn insert(db: &Database, party: NewParty) -> Result<Party> {
        let id = Counter::next_id::<Party>(&Coll::from_db(db)).await?;
        let party = Party { id, party };
        Coll::<Party>::from_db(db).insert_one(&party, None).await?;
        Ok(party)
    }

    /// Hard-delete a party, cascading to its candidates and their
    /// background records. Refused once any of those candidates has
    /// received a vote, since votes must keep their referents.
    pub async fn delete_cascade(db_client: &Client, db: &Database, party_id: PartyId) -> Result<()> {
        let candidates = Coll::<Candidate>::from_db(db);
        let owned: Vec<Candidate> = candidates
            .find(doc! { "party_id": party_id }, None)
            .await?
            .try_collect()
            .await?;
        let owned_ids: Vec<_> = owned.iter().map(|candidate| candidate.id).collect();

        let votes_received = Coll::<Vote>::from_db(db)
            .count_documents(doc! { "candidate_id": { "$in": owned_ids.clone() } }, None)
            .await?;
        if votes_received > 0 {
            return Err(Error::Conflict(format!(
                "Party {party_id} has candidates with recorded votes and cannot be deleted"
            )));
        }

        let mut session = db_client.start_session(None).await?;
        session.start_transaction(None).await?;

        Coll::<Background>::from_db(db)
            .delete_many_with_session(
                doc! { "candidate_id": { "$in": owned_ids } },
                None,
                &mut session,
            )
            .await?;
        candidates
            .delete_many_with_session(doc! { "party_id": party_id }, None, &mut session)
            .await?;
        let result = Coll::<Party>::from_db(db)
            .delete_one_with_session(id_filter(party_id), None, &mut session)
            .await?;
        if result.deleted_count == 0 {
            return Err(Error::not_found(format!("Party {party_id}")));
        }

        session.commit_transaction().await?;
        Ok(())
    }
}

impl Deref for Party {
    type Target = PartyCore;

    fn deref(&self) -> &Self::Target {
        &self.party
    }
}

impl DerefMut for Party {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.party
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl PartyCore {
        pub fn example1() -> Self {
            Self {
                name: "Partido Morado".to_string(),
                code: "PM".to_string(),
                logo_url: None,
                status: Status::Active,
            }
        }

        pub fn example2() -> Self {
            Self {
                name: "Fuerza Popular".to_string(),
                code: "FP".to_string(),
                logo_url: Some("https://example.com/logos/fp.png".to_string()),
                status: Status::Active,
            }
        }
    }
}
