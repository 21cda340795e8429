use std::{fmt::Display, ops::Deref, str::FromStr};

use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DNI_LENGTH: usize = 8;

/// A national identity number: exactly eight decimal digits. The format
/// is checked on every way in (deserialisation included), so a held `Dni`
/// is always well-formed.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dni(String);

impl Dni {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Dni {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Dni {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Error)]
#[error("A DNI must be exactly {DNI_LENGTH} numeric digits")]
pub struct ParseDniError;

impl FromStr for Dni {
    type Err = ParseDniError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == DNI_LENGTH && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseDniError)
        }
    }
}

impl TryFrom<String> for Dni {
    type Error = ParseDniError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Dni> for String {
    fn from(dni: Dni) -> Self {
        dni.0
    }
}

impl From<Dni> for Bson {
    fn from(dni: Dni) -> Self {
        Bson::String(dni.0)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Dni {
        pub fn example() -> Self {
            "46027896".parse().unwrap()
        }

        pub fn example2() -> Self {
            "70315648".parse().unwrap()
        }

        /// The DNI the stubbed registry reports as unknown.
        pub fn unknown() -> Self {
            "00000000".parse().unwrap()
        }
    }
}
