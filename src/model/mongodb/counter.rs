use mongodb::{
    bson::doc,
    error::Error as DbError,
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Database,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::db::{Background, Candidate, Party, Region, Vote, Voter};

use super::collection::{Coll, MongoCollection};

/// A counter object used to implement auto-increment ids, keyed by the
/// collection it allocates for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u32,
}

impl Counter {
    /// Create a new `Counter` for the given collection, starting at the given value.
    pub fn new(collection: impl Into<String>, start: u32) -> Self {
        Self {
            id: collection.into(),
            next: start,
        }
    }

    /// Atomically take the next id for collection `T`.
    pub async fn next_id<T: MongoCollection>(counters: &Coll<Counter>) -> Result<u32> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": T::NAME }, update, options)
            .await?
            .ok_or_else(|| Error::Internal(format!("No id counter for collection {}", T::NAME)))?;
        Ok(counter.next)
    }
}

/// Collections that allocate their ids from a counter.
const COUNTED_COLLECTIONS: [&str; 6] = [
    Region::NAME,
    Party::NAME,
    Candidate::NAME,
    Background::NAME,
    Voter::NAME,
    Vote::NAME,
];

/// Ensure that an id counter exists for every counted collection.
///
/// This operation is idempotent.
pub async fn ensure_counters_exist(db: &Database) -> std::result::Result<(), DbError> {
    debug!("Ensuring id counters exist");

    let counters = Coll::<Counter>::from_db(db);
    for collection in COUNTED_COLLECTIONS {
        let existing = counters.find_one(doc! { "_id": collection }, None).await?;
        if existing.is_none() {
            counters.insert_one(Counter::new(collection, 1), None).await?;
        }
    }

    Ok(())
}
