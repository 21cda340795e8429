use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

/// Lifecycle marker for parties, candidates and voters. Retired rows stay
/// in place so existing votes keep their referents, but drop out of every
/// listing and write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Retired,
}

impl Status {
    pub fn is_active(self) -> bool {
        matches!(self, Status::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Retired => "retired",
        }
    }
}

impl From<Status> for Bson {
    fn from(status: Status) -> Self {
        Bson::String(status.as_str().to_string())
    }
}
