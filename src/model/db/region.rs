use std::ops::{Deref, DerefMut};

use mongodb::Database;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::RegionId,
    mongodb::{Coll, Counter},
};

/// A geographic subdivision. Regions are immutable reference data created
/// at bootstrap; nothing ever deletes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCore {
    pub name: String,
}

/// A region without an id.
pub type NewRegion = RegionCore;

/// A region from the database, with its unique id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    #[serde(rename = "_id")]
    pub id: RegionId,
    #[serde(flatten)]
    pub region: RegionCore,
}

impl Region {
    /// Insert a new region under a freshly allocated id.
    pub async fn insert(db: &Database, region: NewRegion) -> Result<Region> {
        let id = Counter::next_id::<Region>(&Coll::from_db(db)).await?;
        let region = Region { id, region };
        Coll::<Region>::from_db(db).insert_one(&region, None).await?;
        Ok(region)
    }
}

impl Deref for Region {
    type Target = RegionCore;

    fn deref(&self) -> &Self::Target {
        &self.region
    }
}

impl DerefMut for Region {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.region
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl RegionCore {
        pub fn lima() -> Self {
            Self {
                name: "Lima".to_string(),
            }
        }

        pub fn cusco() -> Self {
            Self {
                name: "Cusco".to_string(),
            }
        }
    }
}
