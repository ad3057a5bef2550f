//! Gazetteer providers: Google Sheets values API and built-in fallback dataset.

use super::types::{CityRecord, Credentials, FetchError};
use serde::Deserialize;
use std::time::Duration;

/// Anything that can hand back raw city rows, header row first.
pub trait CityRowSource: Send + Sync {
    fn fetch_city_rows(
        &self,
        dataset_id: &str,
        sheet_name: &str,
        credentials: &Credentials,
    ) -> Result<Vec<Vec<String>>, FetchError>;
}

// ─── Built-in dataset ───────────────────────────────────────────

struct BuiltinCity {
    id: u32,
    name: &'static str,
    zone_id: u32,
    zone: &'static str,
    district_id: u32,
    district: &'static str,
}

const BUILTIN_CITIES: &[BuiltinCity] = &[
    BuiltinCity { id: 1, name: "Colombo", zone_id: 1, zone: "Western", district_id: 1, district: "Colombo" },
    BuiltinCity { id: 2, name: "Dehiwala-Mount Lavinia", zone_id: 1, zone: "Western", district_id: 1, district: "Colombo" },
    BuiltinCity { id: 3, name: "Moratuwa", zone_id: 1, zone: "Western", district_id: 1, district: "Colombo" },
    BuiltinCity { id: 4, name: "Maharagama", zone_id: 1, zone: "Western", district_id: 1, district: "Colombo" },
    BuiltinCity { id: 5, name: "Gampaha", zone_id: 1, zone: "Western", district_id: 2, district: "Gampaha" },
    BuiltinCity { id: 6, name: "Negombo", zone_id: 1, zone: "Western", district_id: 2, district: "Gampaha" },
    BuiltinCity { id: 7, name: "Kalutara", zone_id: 1, zone: "Western", district_id: 3, district: "Kalutara" },
    BuiltinCity { id: 8, name: "Panadura", zone_id: 1, zone: "Western", district_id: 3, district: "Kalutara" },
    BuiltinCity { id: 9, name: "Kandy", zone_id: 2, zone: "Central", district_id: 4, district: "Kandy" },
    BuiltinCity { id: 10, name: "Matale", zone_id: 2, zone: "Central", district_id: 5, district: "Matale" },
    BuiltinCity { id: 11, name: "Nuwara Eliya", zone_id: 2, zone: "Central", district_id: 6, district: "Nuwara Eliya" },
    BuiltinCity { id: 12, name: "Galle", zone_id: 3, zone: "Southern", district_id: 7, district: "Galle" },
    BuiltinCity { id: 13, name: "Matara", zone_id: 3, zone: "Southern", district_id: 8, district: "Matara" },
    BuiltinCity { id: 14, name: "Hambantota", zone_id: 3, zone: "Southern", district_id: 9, district: "Hambantota" },
    BuiltinCity { id: 15, name: "Jaffna", zone_id: 4, zone: "Northern", district_id: 10, district: "Jaffna" },
    BuiltinCity { id: 16, name: "Vavuniya", zone_id: 4, zone: "Northern", district_id: 11, district: "Vavuniya" },
    BuiltinCity { id: 17, name: "Trincomalee", zone_id: 5, zone: "Eastern", district_id: 12, district: "Trincomalee" },
    BuiltinCity { id: 18, name: "Batticaloa", zone_id: 5, zone: "Eastern", district_id: 13, district: "Batticaloa" },
    BuiltinCity { id: 19, name: "Ampara", zone_id: 5, zone: "Eastern", district_id: 14, district: "Ampara" },
    BuiltinCity { id: 20, name: "Kurunegala", zone_id: 6, zone: "North Western", district_id: 15, district: "Kurunegala" },
    BuiltinCity { id: 21, name: "Puttalam", zone_id: 6, zone: "North Western", district_id: 16, district: "Puttalam" },
    BuiltinCity { id: 22, name: "Anuradhapura", zone_id: 7, zone: "North Central", district_id: 17, district: "Anuradhapura" },
    BuiltinCity { id: 23, name: "Polonnaruwa", zone_id: 7, zone: "North Central", district_id: 18, district: "Polonnaruwa" },
    BuiltinCity { id: 24, name: "Badulla", zone_id: 8, zone: "Uva", district_id: 19, district: "Badulla" },
    BuiltinCity { id: 25, name: "Monaragala", zone_id: 8, zone: "Uva", district_id: 20, district: "Monaragala" },
    BuiltinCity { id: 26, name: "Ratnapura", zone_id: 9, zone: "Sabaragamuwa", district_id: 21, district: "Ratnapura" },
    BuiltinCity { id: 27, name: "Kegalle", zone_id: 9, zone: "Sabaragamuwa", district_id: 22, district: "Kegalle" },
];

/// The fixed dataset served when the sheet is unavailable or unconfigured.
pub fn builtin_records() -> Vec<CityRecord> {
    BUILTIN_CITIES
        .iter()
        .map(|c| {
            CityRecord::new(
                c.name,
                Some(c.id),
                Some(c.zone_id),
                Some(c.zone.to_string()),
                Some(c.district_id),
                Some(c.district.to_string()),
            )
        })
        .collect()
}

// ─── Google Sheets provider ─────────────────────────────────────

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const USER_AGENT: &str = "WaybillLocator/0.3 (address-resolution)";

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Reads a sheet through the Sheets v4 `values` endpoint.
pub struct SheetsSource {
    base_url: String,
    timeout: Duration,
}

impl SheetsSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            base_url: SHEETS_BASE_URL.to_string(),
            timeout,
        }
    }

    /// Point at a different endpoint (for testing against a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn values_url(&self, dataset_id: &str, sheet_name: &str, credentials: &Credentials) -> String {
        let mut url = format!(
            "{}/{}/values/{}",
            self.base_url,
            urlencod(dataset_id),
            urlencod(sheet_name),
        );
        if let Credentials::ApiKey(key) = credentials {
            url.push_str("?key=");
            url.push_str(&urlencod(key));
        }
        url
    }
}

impl CityRowSource for SheetsSource {
    fn fetch_city_rows(
        &self,
        dataset_id: &str,
        sheet_name: &str,
        credentials: &Credentials,
    ) -> Result<Vec<Vec<String>>, FetchError> {
        let url = self.values_url(dataset_id, sheet_name, credentials);

        let mut request = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .timeout(self.timeout);
        if let Credentials::AccessToken(token) = credentials {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }

        let response = request.call().map_err(map_ureq_error)?;

        let body: ValueRange = response
            .into_json()
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        Ok(body.values.into_iter().map(|row| row.into_iter().map(cell_text).collect()).collect())
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn map_ureq_error(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_json::<ApiErrorEnvelope>()
                .map(|e| e.error.message)
                .unwrap_or_default();
            status_error(status, message)
        }
        ureq::Error::Transport(t) => FetchError::Network(t.to_string()),
    }
}

fn status_error(status: u16, message: String) -> FetchError {
    match status {
        400 => FetchError::BadRequest(message),
        403 => FetchError::Forbidden,
        404 => FetchError::NotFound,
        _ => FetchError::Http { status, message },
    }
}

/// A source that always reports missing configuration. Used in offline mode.
pub struct UnconfiguredSource;

impl CityRowSource for UnconfiguredSource {
    fn fetch_city_rows(&self, _: &str, _: &str, _: &Credentials) -> Result<Vec<Vec<String>>, FetchError> {
        Err(FetchError::ConfigurationMissing("data source disabled"))
    }
}

// ─── URL encoding (minimal, no extra dep) ───────────────────────

fn urlencod(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
