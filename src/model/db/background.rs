use std::ops::{Deref, DerefMut};

use chrono::NaiveDate;
use mongodb::Database;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::{BackgroundId, BackgroundKind, CandidateId},
    mongodb::{Coll, Counter},
};

/// A public disclosure item attached to a candidate: a complaint against
/// them, a project they carried out, or a proposal they stand for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundCore {
    pub candidate_id: CandidateId,
    pub kind: BackgroundKind,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub source_url: Option<String>,
}

/// A background record without an id.
pub type NewBackground = BackgroundCore;

/// A background record from the database, with its unique id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Background {
    #[serde(rename = "_id")]
    pub id: BackgroundId,
    #[serde(flatten)]
    pub background: BackgroundCore,
}

impl Background {
    /// Insert a new background record under a freshly allocated id.
    pub async fn insert(db: &Database, background: NewBackground) -> Result<Background> {
        let id = Counter::next_id::<Background>(&Coll::from_db(db)).await?;
        let background = Background { id, background };
        Coll::<Background>::from_db(db)
            .insert_one(&background, None)
            .await?;
        Ok(background)
    }
}

impl Deref for Background {
    type Target = BackgroundCore;

    fn deref(&self) -> &Self::Target {
        &self.background
    }
}

impl DerefMut for Background {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.background
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl BackgroundCore {
        pub fn complaint(candidate_id: CandidateId) -> Self {
            Self {
                candidate_id,
                kind: BackgroundKind::Complaint,
                title: "Investigated for misuse of funds".to_string(),
                description: "Open fiscal investigation from a previous term.".to_string(),
                date: NaiveDate::from_ymd_opt(2021, 6, 15).unwrap(),
                source_url: Some("https://example.com/cases/1234".to_string()),
            }
        }

        pub fn proposal(candidate_id: CandidateId) -> Self {
            Self {
                candidate_id,
                kind: BackgroundKind::Proposal,
                title: "Rural connectivity plan".to_string(),
                description: "Broadband coverage for every district capital.".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                source_url: None,
            }
        }
    }
}
