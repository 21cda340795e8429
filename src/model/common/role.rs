use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

/// What a registered account is entitled to do. Guests can browse but not
/// cast votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Voter,
    Guest,
}

impl Role {
    pub fn can_cast(self) -> bool {
        matches!(self, Role::Voter)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Voter => "voter",
            Role::Guest => "guest",
        }
    }
}

impl From<Role> for Bson {
    fn from(role: Role) -> Self {
        Bson::String(role.as_str().to_string())
    }
}
