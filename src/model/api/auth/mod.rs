mod request;
mod token;

pub use request::{LoginRequest, RefreshRequest, RegisterRequest, ValidateDniRequest};
pub use token::{AuthToken, TokenKind, TokenPair};

use serde::{Deserialize, Serialize};

use crate::model::api::voter::VoterProfile;

/// Registration/login response: the voter's profile plus a fresh session
/// token pair.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub voter: VoterProfile,
    pub tokens: TokenPair,
}
