//! Core types for the gazetteer subsystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One city of the reference dataset with its administrative hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,
    #[serde(default)]
    pub city_id: Option<u32>,
    #[serde(default)]
    pub zone_id: Option<u32>,
    #[serde(default)]
    pub zone_name: Option<String>,
    #[serde(default)]
    pub district_id: Option<u32>,
    #[serde(default)]
    pub district_name: Option<String>,
    /// District name if present, else zone name, else empty.
    pub region: String,
}

impl CityRecord {
    /// Build a record, deriving `region` once from the hierarchy.
    ///
    /// Blank optional names are normalized to `None` so that downstream
    /// scoring can treat "missing" and "empty" identically.
    pub fn new(
        name: impl Into<String>,
        city_id: Option<u32>,
        zone_id: Option<u32>,
        zone_name: Option<String>,
        district_id: Option<u32>,
        district_name: Option<String>,
    ) -> Self {
        let zone_name = non_blank(zone_name);
        let district_name = non_blank(district_name);
        let region = district_name
            .clone()
            .or_else(|| zone_name.clone())
            .unwrap_or_default();

        Self {
            name: name.into().trim().to_string(),
            city_id: city_id.filter(|id| *id > 0),
            zone_id,
            zone_name,
            district_id,
            district_name,
            region,
        }
    }

    /// A record with only a name and district.
    pub fn with_district(name: &str, district: &str) -> Self {
        Self::new(name, None, None, None, None, Some(district.to_string()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl fmt::Display for CityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.region.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.region)
        }
    }
}

/// Where the records of a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotOrigin {
    Remote,
    Builtin,
}

impl fmt::Display for SnapshotOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "Remote"),
            Self::Builtin => write!(f, "Built-in"),
        }
    }
}

/// An immutable view of the gazetteer at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct GazetteerSnapshot {
    pub records: Vec<CityRecord>,
    pub fetched_at: DateTime<Utc>,
    pub origin: SnapshotOrigin,
}

impl GazetteerSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Credential presented to the tabular data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OAuth bearer token supplied by the surrounding application.
    AccessToken(String),
    /// Statically configured API key.
    ApiKey(String),
}

impl Credentials {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AccessToken(_) => "access token",
            Self::ApiKey(_) => "api key",
        }
    }
}

/// Errors from fetching raw city rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Missing configuration: {0}")]
    ConfigurationMissing(&'static str),
    #[error("Sheet not found")]
    NotFound,
    #[error("Access to sheet forbidden")]
    Forbidden,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
    #[error("Sheet returned no usable rows")]
    EmptyDataset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_prefers_district() {
        let city = CityRecord::new(
            "Negombo",
            Some(7),
            Some(1),
            Some("Western".into()),
            Some(2),
            Some("Gampaha".into()),
        );
        assert_eq!(city.region, "Gampaha");
    }

    #[test]
    fn test_region_falls_back_to_zone() {
        let city = CityRecord::new("Negombo", None, None, Some("Western".into()), None, Some("  ".into()));
        assert_eq!(city.region, "Western");
        assert!(city.district_name.is_none());
    }

    #[test]
    fn test_region_empty_without_hierarchy() {
        let city = CityRecord::new("Negombo", None, None, None, None, None);
        assert_eq!(city.region, "");
        assert_eq!(city.to_string(), "Negombo");
    }

    #[test]
    fn test_zero_city_id_is_absent() {
        let city = CityRecord::new("Negombo", Some(0), None, None, None, None);
        assert!(city.city_id.is_none());
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Http { status: 503, message: "unavailable".into() };
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
    }
}
