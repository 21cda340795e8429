use std::{fmt::Display, str::FromStr};

use mongodb::bson::Bson;
use rocket::{
    form::{self, FromFormField, ValueField},
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An elected position. Each office is an independent ballot: a voter gets
/// one vote per office, and the set of offices is fixed.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Office {
    President,
    Senator,
    Representative,
}

impl Office {
    /// Every office, in ballot order.
    pub const ALL: [Office; 3] = [Office::President, Office::Senator, Office::Representative];

    /// Representative candidacies are scoped to a single region; the other
    /// offices run nationally.
    pub fn is_region_scoped(self) -> bool {
        matches!(self, Office::Representative)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Office::President => "president",
            Office::Senator => "senator",
            Office::Representative => "representative",
        }
    }
}

impl Display for Office {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown office `{0}`")]
pub struct ParseOfficeError(String);

impl FromStr for Office {
    type Err = ParseOfficeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "president" => Ok(Office::President),
            "senator" => Ok(Office::Senator),
            "representative" => Ok(Office::Representative),
            _ => Err(ParseOfficeError(s.to_string())),
        }
    }
}

impl<'a> FromParam<'a> for Office {
    type Error = ParseOfficeError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for Office {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        field
            .value
            .parse()
            .map_err(|err: ParseOfficeError| form::Error::validation(err.to_string()).into())
    }
}

impl From<Office> for Bson {
    fn from(office: Office) -> Self {
        Bson::String(office.as_str().to_string())
    }
}

impl UriDisplay<Path> for Office {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
        formatter.write_value(self.as_str())
    }
}

impl_from_uri_param_identity!([Path] Office);
