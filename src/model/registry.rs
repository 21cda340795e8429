use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::error::Error;
use crate::model::api::{Dni, PersonRecord};

/// How long a lookup may take before we report the registry unavailable.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the national identity registry, the external collaborator
/// that resolves a DNI to a citizen's legal name. Lookups are bounded by
/// [`LOOKUP_TIMEOUT`] and never retried automatically.
pub struct Registry {
    #[cfg_attr(test, allow(dead_code))]
    client: reqwest::Client,
    #[cfg_attr(test, allow(dead_code))]
    url: String,
    #[cfg_attr(test, allow(dead_code))]
    token: String,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("DNI {0} is not registered")]
    UnknownId(Dni),
    #[error("Identity registry timed out")]
    Timeout,
    #[error("Identity registry unreachable: {0}")]
    Unreachable(reqwest::Error),
    #[error("Identity registry returned status {0}")]
    Upstream(StatusCode),
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownId(_) => Error::Validation(err.to_string()),
            RegistryError::Timeout | RegistryError::Unreachable(_) | RegistryError::Upstream(_) => {
                Error::ServiceUnavailable(err.to_string())
            }
        }
    }
}

/// Raw upstream payload; field names follow the registry's API.
#[cfg_attr(test, allow(dead_code))]
#[derive(Debug, Deserialize)]
struct LookupResponse {
    first_name: String,
    first_last_name: String,
    second_last_name: String,
    document_number: String,
}

impl Registry {
    pub fn new(url: String, token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .expect("Default reqwest client configuration is valid");
        Self { client, url, token }
    }

    /// Resolve a DNI to a person record.
    #[cfg(not(test))]
    pub async fn lookup(&self, dni: &Dni) -> Result<PersonRecord, RegistryError> {
        let mut request = self.client.get(&self.url).query(&[("numero", dni.as_str())]);
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                RegistryError::Timeout
            } else {
                RegistryError::Unreachable(err)
            }
        })?;

        match response.status() {
            StatusCode::OK => {
                let body: LookupResponse =
                    response.json().await.map_err(RegistryError::Unreachable)?;
                Ok(PersonRecord {
                    // Fall back to the requested DNI if the upstream echo is
                    // malformed.
                    dni: body
                        .document_number
                        .trim()
                        .parse()
                        .unwrap_or_else(|_| dni.clone()),
                    given_names: body.first_name.trim().to_string(),
                    paternal_surname: body.first_last_name.trim().to_string(),
                    maternal_surname: body.second_last_name.trim().to_string(),
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                Err(RegistryError::UnknownId(dni.clone()))
            }
            status => Err(RegistryError::Upstream(status)),
        }
    }

    /// Test stand-in, no network: the all-zero DNI reports unknown, any
    /// other well-formed DNI resolves to a deterministic record.
    #[cfg(test)]
    pub async fn lookup(&self, dni: &Dni) -> Result<PersonRecord, RegistryError> {
        if dni.as_str() == "00000000" {
            return Err(RegistryError::UnknownId(dni.clone()));
        }
        let mut person = PersonRecord::example();
        person.dni = dni.clone();
        Ok(person)
    }
}
