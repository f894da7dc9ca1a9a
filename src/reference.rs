//! Static reference lookups — aircraft and livery display names.
//!
//! Pre-populated, read-only mappings from a stable identifier to a
//! human-readable name. Loading and parsing the source tables is the
//! caller's job; a missing identifier is a loud lookup failure, never a
//! placeholder.

use std::collections::HashMap;

use crate::error::Error;

/// Read-only aircraft / livery name tables.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    aircraft: HashMap<String, String>,
    liveries: HashMap<String, String>,
}

impl ReferenceData {
    /// Build the tables from pre-loaded (id, name) pairs.
    pub fn from_pairs(
        aircraft: impl IntoIterator<Item = (String, String)>,
        liveries: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            aircraft: aircraft.into_iter().collect(),
            liveries: liveries.into_iter().collect(),
        }
    }

    /// Display name for an aircraft type identifier.
    pub fn aircraft_name(&self, id: &str) -> Result<&str, Error> {
        self.aircraft
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownAircraft(id.to_string()))
    }

    /// Display name for a livery identifier.
    pub fn livery_name(&self, id: &str) -> Result<&str, Error> {
        self.liveries
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownLivery(id.to_string()))
    }
}
