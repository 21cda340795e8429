use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

/// Kind of public disclosure attached to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    Complaint,
    Project,
    Proposal,
}

impl BackgroundKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundKind::Complaint => "complaint",
            BackgroundKind::Project => "project",
            BackgroundKind::Proposal => "proposal",
        }
    }
}

impl From<BackgroundKind> for Bson {
    fn from(kind: BackgroundKind) -> Self {
        Bson::String(kind.as_str().to_string())
    }
}
