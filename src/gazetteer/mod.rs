//! Gazetteer subsystem for Waybill Locator.
//!
//! Holds the city reference dataset in a TTL cache, fetches it from a
//! spreadsheet, and falls back to a built-in dataset when the sheet is
//! unreachable or unconfigured.

pub mod cache;
pub mod providers;
pub mod sheet;
pub mod types;

pub use cache::{Clock, GazetteerCache, RefreshOutcome, SourceSettings, SystemClock};
pub use providers::{builtin_records, CityRowSource, SheetsSource, UnconfiguredSource};
pub use sheet::records_from_rows;
pub use types::{CityRecord, Credentials, FetchError, GazetteerSnapshot, SnapshotOrigin};
