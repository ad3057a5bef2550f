//! Address resolver — classifies, tokenizes, scores every city, then decides.
//!
//! Flow:  length check → gazetteer snapshot (may refresh) → lines + tokens
//!        → score each city → drop zero scores → rank → confidence policy

use super::decision;
use super::lines::classify;
use super::scoring::{breakdown, ScoreInputs};
use super::tokens::tokenize;
use super::types::{Resolution, ResolutionError, ScoredCandidate, MIN_ADDRESS_CHARS};
use crate::config::Config;
use crate::gazetteer::{
    CityRecord, CityRowSource, GazetteerCache, GazetteerSnapshot, RefreshOutcome, SheetsSource,
    UnconfiguredSource,
};
use log::debug;
use std::sync::Arc;

/// The address resolver over a shared gazetteer cache.
pub struct AddressResolver {
    cache: Arc<GazetteerCache>,
}

impl AddressResolver {
    pub fn new(cache: Arc<GazetteerCache>) -> Self {
        Self { cache }
    }

    /// Build a resolver reading the configured sheet. In offline mode the
    /// sheet is never contacted and the built-in dataset is served.
    pub fn from_config(config: &Config, offline: bool) -> Self {
        let source: Box<dyn CityRowSource> = if offline {
            Box::new(UnconfiguredSource)
        } else {
            Box::new(SheetsSource::new(config.fetch_timeout()))
        };
        let cache = GazetteerCache::new(source, config.source_settings());
        cache.set_access_token(config.access_token.clone());
        Self::new(Arc::new(cache))
    }

    pub fn cache(&self) -> &GazetteerCache {
        &self.cache
    }

    /// Current gazetteer, refreshed if stale.
    pub fn gazetteer(&self) -> Arc<GazetteerSnapshot> {
        self.cache.records()
    }

    /// Resolve an address to its most likely city. `Ok(None)` means no confident match.
    pub fn resolve_city(&self, address: &str) -> Result<Option<CityRecord>, ResolutionError> {
        Ok(self.resolve_detailed(address)?.city)
    }

    /// Resolve and keep the ranked candidates.
    pub fn resolve_detailed(&self, address: &str) -> Result<Resolution, ResolutionError> {
        check_length(address)?;
        let snapshot = self.cache.records();
        let resolution = resolve_in(&snapshot, address)?;

        debug!(
            "Resolved address to {} (score {:?}, {} candidates, {} data)",
            resolution.city.as_ref().map_or("nothing", |c| c.name.as_str()),
            resolution.score,
            resolution.candidates.len(),
            snapshot.origin,
        );
        Ok(resolution)
    }

    /// Explicit cache invalidation. Fetch failures are absorbed into the outcome.
    pub fn refresh_gazetteer(&self, force: bool) -> RefreshOutcome {
        self.cache.refresh(force)
    }
}

fn check_length(address: &str) -> Result<(), ResolutionError> {
    let len = address.trim().chars().count();
    if len < MIN_ADDRESS_CHARS {
        return Err(ResolutionError::InputTooShort { len });
    }
    Ok(())
}

/// Every record with a positive score for the address, highest first.
pub fn rank_candidates(records: &[CityRecord], address: &str) -> Vec<ScoredCandidate> {
    let lines = classify(address);
    let tokens = tokenize(address);
    let inputs = ScoreInputs::new(address, &lines, &tokens);

    let mut candidates: Vec<ScoredCandidate> = records
        .iter()
        .filter_map(|city| {
            let breakdown = breakdown(city, &inputs);
            let score = breakdown.total();
            (score > 0).then(|| ScoredCandidate {
                city: city.clone(),
                score,
                breakdown,
            })
        })
        .collect();
    decision::rank(&mut candidates);
    candidates
}

/// Resolve against a fixed snapshot. Pure: no refresh, no I/O.
pub fn resolve_in(snapshot: &GazetteerSnapshot, address: &str) -> Result<Resolution, ResolutionError> {
    check_length(address)?;

    let candidates = rank_candidates(&snapshot.records, address);
    let city = decision::decide(&candidates).cloned();
    let score = city.as_ref().and(candidates.first().map(|c| c.score));

    Ok(Resolution {
        city,
        score,
        candidates,
        origin: snapshot.origin,
    })
}
