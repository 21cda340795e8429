use serde::{Deserialize, Serialize};

use crate::model::common::RegionId;

/// Pre-registration DNI check against the identity registry.
///
/// The DNI travels as a plain string in every auth request so that a bad
/// format surfaces as a 400 validation error from the handler rather than
/// a deserialisation failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateDniRequest {
    pub dni: String,
}

/// A registration request. Names are not supplied by the caller; they
/// come from the identity registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub dni: String,
    pub region_id: RegionId,
    pub credential: String,
}

/// A login request for an existing voter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub dni: String,
    pub credential: String,
}

/// A token-refresh request carrying the refresh half of a token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use crate::model::api::Dni;

    impl RegisterRequest {
        pub fn example(region_id: RegionId) -> Self {
            Self {
                dni: Dni::example().to_string(),
                region_id,
                credential: "secret123".to_string(),
            }
        }
    }

    impl LoginRequest {
        pub fn example() -> Self {
            Self {
                dni: Dni::example().to_string(),
                credential: "secret123".to_string(),
            }
        }
    }
}
