//! In-memory gazetteer cache with a time-to-live.
//!
//! TTL: 5 minutes by default. A successful non-empty fetch replaces the
//! snapshot and resets the clock. Failures never reach callers: the previous
//! snapshot keeps serving, or the built-in dataset is installed when nothing
//! was ever fetched. An installed built-in snapshot ages like any other, so
//! the source is retried once its TTL lapses or on a forced refresh.

use super::providers::{builtin_records, CityRowSource};
use super::sheet::records_from_rows;
use super::types::{Credentials, FetchError, GazetteerSnapshot, SnapshotOrigin};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

pub const DEFAULT_TTL_SECS: i64 = 5 * 60;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Where and how to reach the sheet.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub api_key: Option<String>,
    pub dataset_id: Option<String>,
    pub sheet_name: String,
    pub ttl: Duration,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            dataset_id: None,
            sheet_name: "Cities".to_string(),
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        }
    }
}

/// What a refresh attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The held snapshot was still within its TTL.
    Fresh,
    /// A new snapshot was fetched.
    Fetched { records: usize },
    /// The fetch failed; the previous remote snapshot stays in place.
    KeptPrevious { reason: FetchError },
    /// The fetch failed with nothing to fall back on; built-in data installed.
    Fallback { reason: FetchError },
}

/// The gazetteer cache.
pub struct GazetteerCache {
    source: Box<dyn CityRowSource>,
    clock: Arc<dyn Clock>,
    settings: SourceSettings,
    access_token: RwLock<Option<String>>,
    snapshot: RwLock<Option<Arc<GazetteerSnapshot>>>,
    refresh_lock: Mutex<()>,
}

impl GazetteerCache {
    pub fn new(source: Box<dyn CityRowSource>, settings: SourceSettings) -> Self {
        Self::with_clock(source, settings, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit clock (for testing).
    pub fn with_clock(
        source: Box<dyn CityRowSource>,
        settings: SourceSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            clock,
            settings,
            access_token: RwLock::new(None),
            snapshot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Replace the externally supplied access token. `None` reverts to the API key.
    pub fn set_access_token(&self, token: Option<String>) {
        let token = token.filter(|t| !t.trim().is_empty());
        *self.access_token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Current records, refreshing first if the TTL has lapsed. Never fails.
    pub fn records(&self) -> Arc<GazetteerSnapshot> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }
        self.refresh(false);
        self.current()
            .unwrap_or_else(|| Arc::new(self.builtin_snapshot()))
    }

    /// The held snapshot without triggering a refresh.
    pub fn current(&self) -> Option<Arc<GazetteerSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Refresh from the source. Without `force`, a fresh snapshot is left alone.
    pub fn refresh(&self, force: bool) -> RefreshOutcome {
        let _guard = self.refresh_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have refreshed while we waited for the lock.
        if !force && self.fresh_snapshot().is_some() {
            return RefreshOutcome::Fresh;
        }

        info!("Refreshing gazetteer from sheet '{}'", self.settings.sheet_name);
        match self.fetch() {
            Ok(snapshot) => {
                let count = snapshot.len();
                info!("Gazetteer refreshed: {} cities", count);
                self.install(snapshot);
                RefreshOutcome::Fetched { records: count }
            }
            Err(reason) => self.absorb(reason),
        }
    }

    fn fetch(&self) -> Result<GazetteerSnapshot, FetchError> {
        let dataset_id = self
            .settings
            .dataset_id
            .as_deref()
            .ok_or(FetchError::ConfigurationMissing("spreadsheet id"))?;
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(FetchError::ConfigurationMissing("api key"))?;
        let credentials = self.credentials(api_key);
        debug!("Fetching city rows using {}", credentials.kind());

        let rows = self
            .source
            .fetch_city_rows(dataset_id, &self.settings.sheet_name, &credentials)?;
        if rows.len() < 2 {
            return Err(FetchError::EmptyDataset);
        }

        let records = records_from_rows(&rows);
        if records.is_empty() {
            return Err(FetchError::EmptyDataset);
        }
        debug!("Mapped {} of {} data rows", records.len(), rows.len() - 1);

        Ok(GazetteerSnapshot {
            records,
            fetched_at: self.clock.now(),
            origin: SnapshotOrigin::Remote,
        })
    }

    /// Access token if one was supplied, else the configured API key.
    fn credentials(&self, api_key: &str) -> Credentials {
        let token = self
            .access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => Credentials::AccessToken(token),
            None => Credentials::ApiKey(api_key.to_string()),
        }
    }

    fn absorb(&self, reason: FetchError) -> RefreshOutcome {
        match self.current() {
            Some(previous) if previous.origin == SnapshotOrigin::Remote => {
                warn!("Gazetteer refresh failed, keeping previous snapshot: {}", reason);
                RefreshOutcome::KeptPrevious { reason }
            }
            _ => {
                if matches!(reason, FetchError::ConfigurationMissing(_)) {
                    info!("Gazetteer source not configured ({}), using built-in dataset", reason);
                } else {
                    warn!("Gazetteer refresh failed, using built-in dataset: {}", reason);
                }
                self.install(self.builtin_snapshot());
                RefreshOutcome::Fallback { reason }
            }
        }
    }

    fn install(&self, snapshot: GazetteerSnapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(snapshot));
    }

    fn builtin_snapshot(&self) -> GazetteerSnapshot {
        GazetteerSnapshot {
            records: builtin_records(),
            fetched_at: self.clock.now(),
            origin: SnapshotOrigin::Builtin,
        }
    }

    fn fresh_snapshot(&self) -> Option<Arc<GazetteerSnapshot>> {
        let snapshot = self.current()?;
        let age = self.clock.now() - snapshot.fetched_at;
        (age <= self.settings.ttl).then_some(snapshot)
    }
}
