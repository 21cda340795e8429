use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::config::Config;
use crate::error::Error;
use crate::model::{
    common::VoterId,
    db::Voter,
    mongodb::{id_filter, Coll},
};

pub const AUTH_HEADER: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

/// Which half of a token pair a JWT represents. Only access tokens grant
/// API access; refresh tokens are exchanged for new pairs.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum TokenKind {
    Access = 0,
    Refresh = 1,
}

/// An authentication token proving a voter's identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "sub")]
    pub voter_id: VoterId,
    #[serde(rename = "knd")]
    pub kind: TokenKind,
}

impl AuthToken {
    /// Serialize this token into a signed JWT with the given expiry.
    pub fn encode(self, expire_at: DateTime<Utc>, config: &Config) -> String {
        let claims = Claims {
            token: self,
            expire_at,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings")
    }

    /// Deserialize and verify a token from its JWT form.
    pub fn decode(token: &str, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

/// JWT claims: the token itself plus an expiry timestamp.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// A freshly issued access/refresh token pair. Issued once per successful
/// registration, login, or refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    pub fn issue(voter: &Voter, config: &Config) -> Self {
        let now = Utc::now();
        let access = AuthToken {
            voter_id: voter.id,
            kind: TokenKind::Access,
        };
        let refresh = AuthToken {
            voter_id: voter.id,
            kind: TokenKind::Refresh,
        };
        Self {
            access: access.encode(now + config.auth_ttl(), config),
            refresh: refresh.encode(now + config.refresh_ttl(), config),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the `Authorization: Bearer` header and
    /// verify that it is an access token for an existing voter.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let header = match req.headers().get_one(AUTH_HEADER) {
            Some(header) => header,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("Missing bearer token"),
                ));
            }
        };
        let raw_token = match header.strip_prefix(BEARER_PREFIX) {
            Some(raw) => raw,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("Malformed Authorization header"),
                ));
            }
        };

        let token = match Self::decode(raw_token, config) {
            Ok(token) => token,
            Err(_) => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("Invalid or expired token"),
                ));
            }
        };

        // Refresh tokens cannot be used to access the API directly.
        if token.kind != TokenKind::Access {
            return Outcome::Failure((
                Status::Unauthorized,
                Error::unauthorized("Not an access token"),
            ));
        }

        // Check the voter actually exists.
        let db = req.guard::<&State<mongodb::Database>>().await.unwrap();
        let voter = Coll::<Voter>::from_db(db)
            .find_one(id_filter(token.voter_id), None)
            .await;
        match voter {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => Outcome::Failure((
                Status::Unauthorized,
                Error::unauthorized("Token does not match a registered voter"),
            )),
            Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
        }
    }
}
