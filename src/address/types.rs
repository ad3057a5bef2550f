//! Core types for address resolution.

use super::scoring::ScoreBreakdown;
use crate::gazetteer::{CityRecord, SnapshotOrigin};
use serde::Serialize;
use thiserror::Error;

/// Addresses shorter than this (after trimming) are rejected.
pub const MIN_ADDRESS_CHARS: usize = 3;

/// A gazetteer city with its score for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredCandidate {
    pub city: CityRecord,
    pub score: u32,
    /// Points behind `score`, per criterion.
    pub breakdown: ScoreBreakdown,
}

/// Full outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The confident winner, or `None` when ambiguous.
    pub city: Option<CityRecord>,
    pub score: Option<u32>,
    /// Every candidate with a positive score, highest first.
    pub candidates: Vec<ScoredCandidate>,
    pub origin: SnapshotOrigin,
}

/// Resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Address too short: {len} characters (need at least {})", MIN_ADDRESS_CHARS)]
    InputTooShort { len: usize },
}
