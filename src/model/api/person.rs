use serde::{Deserialize, Serialize};

use super::Dni;

/// A citizen record as reported by the national identity registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub dni: Dni,
    pub given_names: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
}
