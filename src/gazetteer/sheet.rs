//! Maps raw spreadsheet rows into city records.
//!
//! Row 0 is the header row. Columns are located by name: an exact match on
//! any alias is tried first across all headers, then a substring match.
//! A column already claimed by another field is never reused, so a
//! `city_id` header cannot be taken for the city name.

use super::types::CityRecord;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    CityId,
    ZoneId,
    DistrictId,
    CityName,
    ZoneName,
    DistrictName,
}

/// Resolution order. Id columns are claimed before name columns.
const FIELDS: &[(Field, &[&str])] = &[
    (Field::CityId, &["city_id"]),
    (Field::ZoneId, &["zone_id"]),
    (Field::DistrictId, &["district_id"]),
    (Field::CityName, &["city_name", "city"]),
    (Field::ZoneName, &["zone_name", "zone"]),
    (Field::DistrictName, &["district_name", "district"]),
];

/// Column indices resolved from a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub city_id: Option<usize>,
    pub city_name: Option<usize>,
    pub zone_id: Option<usize>,
    pub zone_name: Option<usize>,
    pub district_id: Option<usize>,
    pub district_name: Option<usize>,
}

impl ColumnMap {
    pub fn from_header(header: &[String]) -> Self {
        let normalized: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();
        let mut claimed = vec![false; normalized.len()];
        let mut map = ColumnMap::default();

        for (field, aliases) in FIELDS {
            let found = find_column(&normalized, &claimed, aliases);
            if let Some(idx) = found {
                claimed[idx] = true;
            }
            match field {
                Field::CityId => map.city_id = found,
                Field::ZoneId => map.zone_id = found,
                Field::DistrictId => map.district_id = found,
                Field::CityName => map.city_name = found,
                Field::ZoneName => map.zone_name = found,
                Field::DistrictName => map.district_name = found,
            }
        }

        map
    }

    /// The name column, defaulting to column 0 when no header matched.
    pub fn name_column(&self) -> usize {
        self.city_name.unwrap_or(0)
    }
}

fn normalize_header(h: &str) -> String {
    h.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn find_column(headers: &[String], claimed: &[bool], aliases: &[&str]) -> Option<usize> {
    let free = |idx: &usize| !claimed[*idx];

    for alias in aliases {
        if let Some(idx) = (0..headers.len()).filter(free).find(|&i| headers[i] == *alias) {
            return Some(idx);
        }
    }
    for alias in aliases {
        if let Some(idx) = (0..headers.len()).filter(free).find(|&i| headers[i].contains(alias)) {
            return Some(idx);
        }
    }
    None
}

/// Strip every non-digit character, then parse. Empty or overflowing input yields `None`.
pub fn parse_numeric(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn cell(row: &[String], idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| row.get(i)).map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Convert a header row plus data rows into records.
///
/// Rows without a resolvable name are dropped.
pub fn records_from_rows(rows: &[Vec<String>]) -> Vec<CityRecord> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };
    let columns = ColumnMap::from_header(header);
    let name_col = Some(columns.name_column());

    let mut dropped = 0usize;
    let records: Vec<CityRecord> = data
        .iter()
        .filter_map(|row| {
            let Some(name) = cell(row, name_col) else {
                dropped += 1;
                return None;
            };
            Some(CityRecord::new(
                name,
                cell(row, columns.city_id).and_then(parse_numeric),
                cell(row, columns.zone_id).and_then(parse_numeric),
                cell(row, columns.zone_name).map(str::to_string),
                cell(row, columns.district_id).and_then(parse_numeric),
                cell(row, columns.district_name).map(str::to_string),
            ))
        })
        .collect();

    if dropped > 0 {
        debug!("Dropped {} sheet rows without a city name", dropped);
    }
    records
}
