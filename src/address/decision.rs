//! Confidence policy over ranked candidates.

use super::types::ScoredCandidate;
use crate::gazetteer::CityRecord;

/// A winner needs more than this score...
pub const MIN_SCORE: u32 = 40;
/// ...and a lead over the runner-up greater than this.
pub const MIN_MARGIN: u32 = 10;
/// Above this score the margin is not required.
pub const HIGH_CONFIDENCE: u32 = 60;

/// Sort by score, highest first. Ties keep discovery order.
pub fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Pick the winner from ranked candidates, or `None` when ambiguous.
pub fn decide(ranked: &[ScoredCandidate]) -> Option<&CityRecord> {
    let best = ranked.first()?;
    let second = ranked.get(1).map_or(0, |c| c.score);
    let margin = best.score.saturating_sub(second);

    if best.score > MIN_SCORE && (margin > MIN_MARGIN || ranked.len() == 1) {
        return Some(&best.city);
    }
    if best.score > HIGH_CONFIDENCE {
        return Some(&best.city);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::scoring::ScoreBreakdown;

    fn candidates(scores: &[(&str, u32)]) -> Vec<ScoredCandidate> {
        scores
            .iter()
            .map(|(name, score)| ScoredCandidate {
                city: CityRecord::new(*name, None, None, None, None, None),
                score: *score,
                breakdown: ScoreBreakdown::default(),
            })
            .collect()
    }

    #[test]
    fn test_clear_margin_wins() {
        let c = candidates(&[("Kandy", 45), ("Matale", 30)]);
        assert_eq!(decide(&c).map(|c| c.name.as_str()), Some("Kandy"));
    }

    #[test]
    fn test_thin_margin_is_ambiguous() {
        let c = candidates(&[("Kandy", 45), ("Matale", 40)]);
        assert!(decide(&c).is_none());
    }

    #[test]
    fn test_margin_of_exactly_ten_is_ambiguous() {
        let c = candidates(&[("Kandy", 50), ("Matale", 40)]);
        assert!(decide(&c).is_none());
    }

    #[test]
    fn test_high_confidence_overrides_margin() {
        let c = candidates(&[("Kandy", 65), ("Matale", 60)]);
        assert_eq!(decide(&c).map(|c| c.name.as_str()), Some("Kandy"));
    }

    #[test]
    fn test_single_candidate() {
        assert!(decide(&candidates(&[("Kandy", 65)])).is_some());
        assert!(decide(&candidates(&[("Kandy", 41)])).is_some());
        assert!(decide(&candidates(&[("Kandy", 40)])).is_none());
    }

    #[test]
    fn test_no_candidates() {
        assert!(decide(&[]).is_none());
    }

    #[test]
    fn test_rank_is_stable() {
        let mut c = candidates(&[("A", 10), ("B", 50), ("C", 10), ("D", 50)]);
        rank(&mut c);
        let order: Vec<&str> = c.iter().map(|c| c.city.name.as_str()).collect();
        assert_eq!(order, vec!["B", "D", "A", "C"]);
    }
}
